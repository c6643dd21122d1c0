//! Exclusion rules for users, groups, and subgroups.
//!
//! Each kind carries a literal list (exact, case-sensitive) and an optional
//! regex (unanchored search). The literal list is consulted first; the first
//! match wins. Regexes are compiled once at construction so a broken pattern
//! fails the cycle before any network call.

use regex::Regex;

use orgsync_config::LdapSettings;

use crate::error::{SyncError, SyncResult};

/// Which entity an exclusion applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionKind {
    User,
    Group,
    Subgroup,
}

#[derive(Debug, Clone)]
struct RuleSet {
    literals: Vec<String>,
    regex: Option<Regex>,
}

impl RuleSet {
    fn new(kind: &'static str, literals: &[String], pattern: &str) -> SyncResult<Self> {
        // Default configurations ship `[""]`; an empty literal must never
        // match anything.
        let literals = literals
            .iter()
            .filter(|l| !l.is_empty())
            .cloned()
            .collect();

        let regex = if pattern.is_empty() {
            None
        } else {
            Some(
                Regex::new(pattern).map_err(|source| SyncError::InvalidExcludePattern {
                    kind,
                    pattern: pattern.to_string(),
                    source,
                })?,
            )
        };

        Ok(Self { literals, regex })
    }

    fn matches(&self, name: &str) -> bool {
        if self.literals.iter().any(|l| l == name) {
            return true;
        }
        self.regex.as_ref().is_some_and(|r| r.is_match(name))
    }

    fn regex_matches(&self, name: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(name))
    }

    fn literal_matches(&self, name: &str) -> bool {
        self.literals.iter().any(|l| l == name)
    }
}

/// Compiled exclusion rules for one configuration.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    users: RuleSet,
    groups: RuleSet,
    subgroups: RuleSet,
}

impl ExclusionFilter {
    pub fn from_settings(settings: &LdapSettings) -> SyncResult<Self> {
        Ok(Self {
            users: RuleSet::new(
                "user",
                &settings.exclude_users,
                &settings.exclude_users_regex,
            )?,
            groups: RuleSet::new(
                "group",
                &settings.exclude_groups,
                &settings.exclude_groups_regex,
            )?,
            subgroups: RuleSet::new(
                "subgroup",
                &settings.exclude_subgroups,
                &settings.exclude_subgroups_regex,
            )?,
        })
    }

    /// Whether `name` is excluded for the given kind.
    #[must_use]
    pub fn is_excluded(&self, kind: ExclusionKind, name: &str) -> bool {
        match kind {
            ExclusionKind::User => self.users.matches(name),
            ExclusionKind::Group => self.groups.matches(name),
            ExclusionKind::Subgroup => self.subgroups.matches(name),
        }
    }

    /// Subgroup exclusion as applied during organization sync: the regex is
    /// checked against the team name, the literal list against the parent
    /// organization's name.
    ///
    /// TODO: checking the literal list against the parent instead of the
    /// team is long-standing behavior; switching it needs a config migration.
    #[must_use]
    pub fn is_subgroup_excluded(&self, team: &str, parent_org: &str) -> bool {
        self.subgroups.regex_matches(team) || self.subgroups.literal_matches(parent_org)
    }
}
