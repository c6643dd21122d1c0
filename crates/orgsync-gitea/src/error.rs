//! Gitea client error types.

use thiserror::Error;

/// Error raised by the Gitea API client.
#[derive(Debug, Error)]
pub enum GiteaError {
    /// Client could not be constructed from the configuration.
    #[error("invalid Gitea client configuration: {0}")]
    InvalidConfig(String),

    /// Transport-level failure (connect, timeout, TLS).
    #[error("Gitea request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Authentication was rejected.
    #[error("Gitea authentication failed: {0}")]
    Auth(String),

    /// The requested entity does not exist.
    #[error("Gitea entity not found: {0}")]
    NotFound(String),

    /// The entity to create already exists.
    #[error("Gitea entity already exists: {0}")]
    AlreadyExists(String),

    /// Response body did not match the expected shape.
    #[error("failed to parse Gitea response: {0}")]
    Parse(String),

    /// Any other non-success API response.
    #[error("Gitea API error (status {status}): {detail}")]
    Api { status: u16, detail: String },
}

/// Result type for Gitea operations.
pub type GiteaResult<T> = Result<T, GiteaError>;
