//! Configuration error types.

use thiserror::Error;

/// Error raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML for the expected shape.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more required settings are missing.
    #[error("required settings are missing: {}", .0.join(", "))]
    MissingSettings(Vec<String>),

    /// A setting has a value that cannot be used.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
