//! Directory entry and snapshot data model.
//!
//! `RawEntry`/`RawDirectory` hold the directory exactly as the server
//! returned it. The `Directory*` types are the resolved snapshot the
//! reconciliation engine consumes; they are immutable once built.

use std::collections::{BTreeMap, HashMap};

use orgsync_config::LdapSettings;

/// A single directory entry: its DN plus all returned attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub dn: String,
    pub attributes: HashMap<String, Vec<String>>,
}

impl RawEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// First value of an attribute, or the empty string when absent.
    ///
    /// Mirrors directory-server semantics where a missing attribute and an
    /// empty attribute read the same.
    #[must_use]
    pub fn attr_first(&self, name: &str) -> &str {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map_or("", String::as_str)
    }

    /// All values of an attribute.
    #[must_use]
    pub fn attr_all(&self, name: &str) -> &[String] {
        self.attributes
            .get(name)
            .map_or(&[], Vec::as_slice)
    }
}

/// Result sets of the five directory searches, before any interpretation.
#[derive(Debug, Clone, Default)]
pub struct RawDirectory {
    pub groups: Vec<RawEntry>,
    pub subgroups: Vec<RawEntry>,
    pub users: Vec<RawEntry>,
    /// Empty when no admin filter is configured.
    pub admins: Vec<RawEntry>,
    /// Empty when no restricted filter is configured.
    pub restricted: Vec<RawEntry>,
}

/// A directory user resolved through the configured attribute mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUser {
    /// Value of the configured username attribute; the identity key.
    pub name: String,
    pub dn: String,
    pub attributes: HashMap<String, Vec<String>>,
    pub admin: bool,
    pub restricted: bool,
}

impl DirectoryUser {
    /// First value of an attribute, or the empty string when absent.
    #[must_use]
    pub fn attr_first(&self, name: &str) -> &str {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map_or("", String::as_str)
    }

    /// Display name: `first surname` when both are present, otherwise the
    /// configured full-name attribute.
    #[must_use]
    pub fn full_name(&self, settings: &LdapSettings) -> String {
        let first = self.attr_first(&settings.user_first_name_attribute);
        let surname = self.attr_first(&settings.user_surname_attribute);

        if !first.is_empty() && !surname.is_empty() {
            format!("{first} {surname}")
        } else {
            self.attr_first(&settings.user_fullname_attribute).to_string()
        }
    }

    #[must_use]
    pub fn email(&self, settings: &LdapSettings) -> String {
        self.attr_first(&settings.user_email_attribute).to_string()
    }
}

/// A team inside an organization, keyed membership included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTeam {
    pub name: String,
    pub dn: String,
    pub description: String,
    /// Members keyed by the username attribute.
    pub users: BTreeMap<String, DirectoryUser>,
}

/// A top-level directory group that maps to a platform organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryOrganization {
    pub name: String,
    pub dn: String,
    pub full_name: String,
    pub description: String,
    pub teams: BTreeMap<String, DirectoryTeam>,
}

/// The fully resolved directory state for one reconciliation cycle.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    pub organizations: BTreeMap<String, DirectoryOrganization>,
    pub users: BTreeMap<String, DirectoryUser>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LdapSettings {
        let config = orgsync_config::Config::from_yaml(
            r#"
gitea: {}
ldap:
  user_first_name_attribute: givenName
  user_surname_attribute: sn
"#,
        )
        .unwrap();
        config.ldap
    }

    fn user_with(attrs: &[(&str, &str)]) -> DirectoryUser {
        let mut attributes = HashMap::new();
        for (name, value) in attrs {
            attributes.insert((*name).to_string(), vec![(*value).to_string()]);
        }
        DirectoryUser {
            name: "jdoe".to_string(),
            dn: "uid=jdoe,ou=users,dc=example,dc=com".to_string(),
            attributes,
            admin: false,
            restricted: false,
        }
    }

    #[test]
    fn test_full_name_from_first_and_surname() {
        let user = user_with(&[("givenName", "John"), ("sn", "Doe"), ("cn", "jdoe-cn")]);
        assert_eq!(user.full_name(&settings()), "John Doe");
    }

    #[test]
    fn test_full_name_falls_back_to_fullname_attribute() {
        let user = user_with(&[("givenName", "John"), ("cn", "John D.")]);
        assert_eq!(user.full_name(&settings()), "John D.");

        let user = user_with(&[("cn", "John D.")]);
        assert_eq!(user.full_name(&settings()), "John D.");
    }

    #[test]
    fn test_full_name_empty_when_nothing_set() {
        let user = user_with(&[]);
        assert_eq!(user.full_name(&settings()), "");
    }

    #[test]
    fn test_raw_entry_attr_accessors() {
        let mut entry = RawEntry::new("cn=devs,ou=groups,dc=example,dc=com");
        entry.attributes.insert(
            "member".to_string(),
            vec!["uid=a".to_string(), "uid=b".to_string()],
        );

        assert_eq!(entry.attr_first("member"), "uid=a");
        assert_eq!(entry.attr_all("member").len(), 2);
        assert_eq!(entry.attr_first("missing"), "");
        assert!(entry.attr_all("missing").is_empty());
    }
}
