//! Configuration model and loading for orgsync.
//!
//! Settings come from a YAML file (`config.yaml` in the working directory or
//! `/etc/orgsync/`, overridable via `ORGSYNC_CONFIG`) with environment
//! variable overrides for endpoints and secrets. Loading is fail-fast: every
//! missing required key is collected and reported in one error before any
//! network connection is attempted.

mod error;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use settings::{
    Config, GiteaSettings, LdapSettings, OrganizationDefaults, SyncDefaults, SyncSettings,
    TeamDefaults, UserDefaults,
};
