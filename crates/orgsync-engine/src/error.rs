//! Engine error types.

use thiserror::Error;

use orgsync_directory::DirectoryError;
use orgsync_gitea::GiteaError;

/// Error raised during a reconciliation cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Directory access or snapshot construction failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A platform API call failed.
    #[error(transparent)]
    Gitea(#[from] GiteaError),

    /// A configured exclusion regex does not compile.
    #[error("invalid {kind} exclusion pattern {pattern:?}: {source}")]
    InvalidExcludePattern {
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;
