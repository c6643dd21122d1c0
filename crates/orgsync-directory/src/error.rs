//! Directory error types.

use thiserror::Error;

/// Error raised while talking to the directory server or building a snapshot.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Could not establish a connection to the directory server.
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: ldap3::LdapError,
    },

    /// The bind operation was rejected.
    #[error("bind failed for {bind_dn:?}: {source}")]
    Bind {
        bind_dn: String,
        #[source]
        source: ldap3::LdapError,
    },

    /// A search returned an error result.
    #[error("search failed (base {base:?}, filter {filter:?}): {source}")]
    Search {
        base: String,
        filter: String,
        #[source]
        source: ldap3::LdapError,
    },

    /// Two directory entries resolved to the same snapshot key.
    #[error("duplicate {kind} key {name:?} in directory snapshot")]
    DuplicateKey { kind: &'static str, name: String },
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
