//! Reconciliation engine for orgsync.
//!
//! Combines the exclusion filter, the membership diff, and the four-phase
//! sync loop. The engine is generic over `GiteaApi`, so the daemon drives a
//! real client and tests drive an in-memory one.

mod diff;
mod engine;
mod error;
mod exclude;

pub use diff::{members_to_add, members_to_remove};
pub use engine::{CycleReport, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use exclude::{ExclusionFilter, ExclusionKind};
