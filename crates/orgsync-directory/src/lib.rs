//! LDAP directory access for orgsync.
//!
//! Splits directory handling into an I/O layer (`LdapDirectory`, one bound
//! connection per cycle, five subtree searches) and a pure snapshot builder
//! (`build_snapshot`) that resolves raw entries through the configured
//! attribute mapping into the keyed state the reconciliation engine reads.

mod client;
mod error;
mod model;
mod snapshot;

pub use client::LdapDirectory;
pub use error::{DirectoryError, DirectoryResult};
pub use model::{
    DirectoryOrganization, DirectorySnapshot, DirectoryTeam, DirectoryUser, RawDirectory, RawEntry,
};
pub use snapshot::build_snapshot;
