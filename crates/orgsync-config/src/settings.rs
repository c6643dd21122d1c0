//! Configuration types, defaults, and loading.

use std::env;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Root configuration for the sync daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub gitea: GiteaSettings,
    pub ldap: LdapSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    /// Cron expression driving the reconciliation schedule.
    #[serde(default = "default_cron_timer")]
    pub cron_timer: String,
    /// When false the daemon runs one cycle and exits.
    #[serde(default = "default_true")]
    pub cron_enabled: bool,
    /// How long shutdown waits for an in-flight cycle before exiting anyway.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

/// Gitea endpoint and credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct GiteaSettings {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub base_url: String,
    /// Authentication source id applied to created users.
    #[serde(default)]
    pub auth_source_id: i64,
    /// Per-request timeout.
    #[serde(default = "default_client_timeout")]
    pub client_timeout_secs: u64,
}

/// LDAP endpoint, search, and attribute mapping settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LdapSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_ldap_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub use_tls: bool,
    #[serde(default = "default_true")]
    pub allow_insecure_tls: bool,
    #[serde(default)]
    pub bind_dn: String,
    #[serde(default)]
    pub bind_password: String,
    /// Per-request timeout for connect and search operations.
    #[serde(default = "default_client_timeout")]
    pub client_timeout_secs: u64,

    #[serde(default)]
    pub user_filter: String,
    #[serde(default)]
    pub user_search_base: String,
    #[serde(default = "default_username_attribute")]
    pub user_username_attribute: String,
    #[serde(default = "default_cn")]
    pub user_fullname_attribute: String,
    #[serde(default = "default_first_name_attribute")]
    pub user_first_name_attribute: String,
    #[serde(default)]
    pub user_surname_attribute: String,
    #[serde(default = "default_email_attribute")]
    pub user_email_attribute: String,
    #[serde(default = "default_avatar_attribute")]
    pub user_avatar_attribute: String,
    #[serde(default = "default_ssh_key_attribute")]
    pub user_public_ssh_key_attribute: String,

    /// Optional filter selecting users that become platform admins.
    #[serde(default)]
    pub admin_filter: String,
    /// Optional filter selecting users that become restricted accounts.
    #[serde(default)]
    pub restricted_filter: String,

    #[serde(default)]
    pub group_search_base: String,
    #[serde(default)]
    pub group_filter: String,
    #[serde(default = "default_cn")]
    pub group_name_attribute: String,
    #[serde(default = "default_cn")]
    pub group_fullname_attribute: String,
    #[serde(default = "default_cn")]
    pub group_description_attribute: String,

    #[serde(default)]
    pub subgroup_search_base: String,
    #[serde(default)]
    pub subgroup_filter: String,
    #[serde(default = "default_cn")]
    pub subgroup_name_attribute: String,
    #[serde(default = "default_cn")]
    pub subgroup_description_attribute: String,

    #[serde(default = "default_exclude_users")]
    pub exclude_users: Vec<String>,
    #[serde(default)]
    pub exclude_users_regex: String,
    #[serde(default)]
    pub exclude_groups: Vec<String>,
    #[serde(default)]
    pub exclude_groups_regex: String,
    #[serde(default)]
    pub exclude_subgroups: Vec<String>,
    #[serde(default)]
    pub exclude_subgroups_regex: String,

    /// Strip the `{parent}{separator}` prefix from subgroup names.
    #[serde(default)]
    pub trim_parent_name: bool,
    #[serde(default = "default_subgroup_separator")]
    pub subgroup_separator: String,
}

/// Sync policy flags and per-entity creation defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    /// Create missing users, organizations, and teams on the platform.
    #[serde(default = "default_true")]
    pub create_groups: bool,
    /// Delete platform entities that are absent from the directory.
    #[serde(default)]
    pub full_sync: bool,
    #[serde(default)]
    pub defaults: SyncDefaults,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncDefaults {
    #[serde(default)]
    pub organization: OrganizationDefaults,
    #[serde(default)]
    pub team: TeamDefaults,
    #[serde(default)]
    pub user: UserDefaults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationDefaults {
    #[serde(default)]
    pub repo_admin_change_team_access: bool,
    #[serde(default = "default_visibility")]
    pub visibility: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamDefaults {
    #[serde(default)]
    pub can_create_org_repo: bool,
    #[serde(default)]
    pub includes_all_repositories: bool,
    #[serde(default = "default_permission")]
    pub permission: String,
    #[serde(default = "default_units")]
    pub units: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserDefaults {
    #[serde(default)]
    pub allow_create_organization: bool,
    #[serde(default)]
    pub max_repo_creation: i64,
    #[serde(default = "default_visibility")]
    pub visibility: String,
}

fn default_true() -> bool {
    true
}

fn default_cron_timer() -> String {
    "* * * * *".to_string()
}

fn default_shutdown_timeout() -> u64 {
    60
}

fn default_client_timeout() -> u64 {
    10
}

fn default_ldap_port() -> u16 {
    389
}

fn default_username_attribute() -> String {
    "sAMAccountName".to_string()
}

fn default_cn() -> String {
    "cn".to_string()
}

fn default_first_name_attribute() -> String {
    "name".to_string()
}

fn default_email_attribute() -> String {
    "mail".to_string()
}

fn default_avatar_attribute() -> String {
    "avatar".to_string()
}

fn default_ssh_key_attribute() -> String {
    "sshPublicKey".to_string()
}

fn default_exclude_users() -> Vec<String> {
    vec!["root".to_string()]
}

fn default_subgroup_separator() -> String {
    "/".to_string()
}

fn default_visibility() -> String {
    "private".to_string()
}

fn default_permission() -> String {
    "read".to_string()
}

fn default_units() -> Vec<String> {
    [
        "repo.code",
        "repo.issues",
        "repo.ext_issues",
        "repo.wiki",
        "repo.pulls",
        "repo.releases",
        "repo.projects",
        "repo.ext_wiki",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            create_groups: true,
            full_sync: false,
            defaults: SyncDefaults::default(),
        }
    }
}

impl Default for OrganizationDefaults {
    fn default() -> Self {
        Self {
            repo_admin_change_team_access: false,
            visibility: default_visibility(),
        }
    }
}

impl Default for TeamDefaults {
    fn default() -> Self {
        Self {
            can_create_org_repo: false,
            includes_all_repositories: false,
            permission: default_permission(),
            units: default_units(),
        }
    }
}

impl Default for UserDefaults {
    fn default() -> Self {
        Self {
            allow_create_organization: false,
            max_repo_creation: 0,
            visibility: default_visibility(),
        }
    }
}

impl Config {
    /// Load configuration from the default locations, apply environment
    /// overrides, and validate.
    pub fn load() -> ConfigResult<Self> {
        let path = Self::config_path();
        debug!(path = %path, "Loading configuration");

        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Resolve the configuration file path.
    ///
    /// `ORGSYNC_CONFIG` wins; otherwise `./config.yaml` is preferred over
    /// `/etc/orgsync/config.yaml`.
    pub fn config_path() -> String {
        if let Ok(path) = env::var("ORGSYNC_CONFIG") {
            return path;
        }
        if Path::new("config.yaml").exists() {
            return "config.yaml".to_string();
        }
        "/etc/orgsync/config.yaml".to_string()
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Apply environment variable overrides for endpoints and secrets.
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        if let Ok(v) = env::var("GITEA_TOKEN") {
            self.gitea.token = v;
        }
        if let Ok(v) = env::var("GITEA_BASE_URL") {
            self.gitea.base_url = v;
        }
        if let Ok(v) = env::var("GITEA_AUTH_SOURCE_ID") {
            self.gitea.auth_source_id =
                v.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "GITEA_AUTH_SOURCE_ID".to_string(),
                    message: format!("expected an integer, got {v:?}"),
                })?;
        }
        if let Ok(v) = env::var("LDAP_URL") {
            self.ldap.url = v;
        }
        if let Ok(v) = env::var("LDAP_PORT") {
            self.ldap.port = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "LDAP_PORT".to_string(),
                message: format!("expected a port number, got {v:?}"),
            })?;
        }
        if let Ok(v) = env::var("LDAP_BIND_DN") {
            self.ldap.bind_dn = v;
        }
        if let Ok(v) = env::var("LDAP_BIND_PASSWORD") {
            self.ldap.bind_password = v;
        }
        if let Ok(v) = env::var("ORGSYNC_CRON_TIMER") {
            self.cron_timer = v;
        }
        if let Ok(v) = env::var("ORGSYNC_CRON_ENABLED") {
            self.cron_enabled = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(())
    }

    /// Check that every required setting is present.
    ///
    /// All missing settings are collected so a broken deployment surfaces
    /// them in one pass instead of one restart per key.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut missing = Vec::new();

        if self.gitea.token.is_empty() {
            missing.push("gitea.token".to_string());
        }
        if self.gitea.base_url.is_empty() {
            missing.push("gitea.base_url".to_string());
        }
        if self.gitea.auth_source_id == 0 {
            missing.push("gitea.auth_source_id".to_string());
        }
        if self.ldap.url.is_empty() {
            missing.push("ldap.url".to_string());
        }
        if self.ldap.bind_dn.is_empty() && self.ldap.bind_password.is_empty() {
            missing.push("ldap.bind_dn".to_string());
            missing.push("ldap.bind_password".to_string());
        }
        if self.ldap.user_filter.is_empty() {
            missing.push("ldap.user_filter".to_string());
        }
        if self.ldap.user_search_base.is_empty() {
            missing.push("ldap.user_search_base".to_string());
        }
        if self.ldap.group_filter.is_empty() {
            missing.push("ldap.group_filter".to_string());
        }
        if self.ldap.group_search_base.is_empty() {
            missing.push("ldap.group_search_base".to_string());
        }
        if self.ldap.subgroup_filter.is_empty() {
            missing.push("ldap.subgroup_filter".to_string());
        }
        if self.ldap.subgroup_search_base.is_empty() {
            missing.push("ldap.subgroup_search_base".to_string());
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingSettings(missing));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
gitea:
  token: secret-token
  base_url: https://gitea.example.com
  auth_source_id: 1
ldap:
  url: ldap.example.com
  bind_dn: cn=admin,dc=example,dc=com
  bind_password: hunter2
  user_filter: "(objectClass=person)"
  user_search_base: ou=users,dc=example,dc=com
  group_filter: "(objectClass=groupOfNames)"
  group_search_base: ou=groups,dc=example,dc=com
  subgroup_filter: "(objectClass=groupOfNames)"
  subgroup_search_base: ou=groups,dc=example,dc=com
"#
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_yaml(minimal_yaml()).unwrap();

        assert_eq!(config.gitea.base_url, "https://gitea.example.com");
        assert_eq!(config.gitea.client_timeout_secs, 10);
        assert_eq!(config.ldap.port, 389);
        assert!(config.ldap.use_tls);
        assert_eq!(config.ldap.user_username_attribute, "sAMAccountName");
        assert_eq!(config.ldap.user_fullname_attribute, "cn");
        assert_eq!(config.ldap.subgroup_separator, "/");
        assert_eq!(config.ldap.exclude_users, vec!["root"]);
        assert!(config.cron_enabled);
        assert_eq!(config.cron_timer, "* * * * *");
        assert_eq!(config.shutdown_timeout_secs, 60);
    }

    #[test]
    fn test_sync_defaults() {
        let config = Config::from_yaml(minimal_yaml()).unwrap();

        assert!(config.sync.create_groups);
        assert!(!config.sync.full_sync);
        assert_eq!(config.sync.defaults.organization.visibility, "private");
        assert_eq!(config.sync.defaults.team.permission, "read");
        assert!(config
            .sync
            .defaults
            .team
            .units
            .contains(&"repo.code".to_string()));
        assert_eq!(config.sync.defaults.user.max_repo_creation, 0);
        assert!(!config.sync.defaults.user.allow_create_organization);
    }

    #[test]
    fn test_validate_minimal_passes() {
        let config = Config::from_yaml(minimal_yaml()).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_all_missing() {
        let config = Config::from_yaml("gitea: {}\nldap: {}\n").unwrap();

        let err = config.validate().unwrap_err();
        match err {
            ConfigError::MissingSettings(missing) => {
                assert!(missing.contains(&"gitea.token".to_string()));
                assert!(missing.contains(&"gitea.base_url".to_string()));
                assert!(missing.contains(&"ldap.url".to_string()));
                assert!(missing.contains(&"ldap.user_filter".to_string()));
                assert!(missing.contains(&"ldap.subgroup_search_base".to_string()));
                // Token-header auth needs no account name.
                assert!(!missing.contains(&"gitea.user".to_string()));
            }
            other => panic!("expected MissingSettings, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_missing_auth_source() {
        let yaml = minimal_yaml().replace("auth_source_id: 1", "auth_source_id: 0");
        let config = Config::from_yaml(&yaml).unwrap();

        let err = config.validate().unwrap_err();
        match err {
            ConfigError::MissingSettings(missing) => {
                assert_eq!(missing, vec!["gitea.auth_source_id".to_string()]);
            }
            other => panic!("expected MissingSettings, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        assert!(Config::from_yaml("gitea: [not, a, map]").is_err());
    }

    #[test]
    fn test_overridden_attributes() {
        let yaml = r#"
gitea:
  token: t
  base_url: https://g
  auth_source_id: 2
ldap:
  url: ldap.example.com
  bind_dn: cn=x
  bind_password: y
  user_filter: "(x)"
  user_search_base: ou=u
  group_filter: "(g)"
  group_search_base: ou=g
  subgroup_filter: "(s)"
  subgroup_search_base: ou=s
  user_username_attribute: uid
  trim_parent_name: true
  subgroup_separator: "-"
sync:
  create_groups: false
  full_sync: true
cron_enabled: false
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.ldap.user_username_attribute, "uid");
        assert!(config.ldap.trim_parent_name);
        assert_eq!(config.ldap.subgroup_separator, "-");
        assert!(!config.sync.create_groups);
        assert!(config.sync.full_sync);
        assert!(!config.cron_enabled);
    }
}
