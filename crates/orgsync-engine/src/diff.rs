//! Team membership diffing.
//!
//! Pure functions: both sides of the diff are already in memory, so these
//! are trivially unit-testable without a platform.

use std::collections::BTreeMap;

use orgsync_config::LdapSettings;
use orgsync_directory::DirectoryTeam;
use orgsync_gitea::GiteaAccount;

/// Directory members missing from the platform team.
///
/// A directory member is an addition candidate when no platform account
/// under the same key carries its login.
#[must_use]
pub fn members_to_add(
    team: &DirectoryTeam,
    accounts: &BTreeMap<String, GiteaAccount>,
    settings: &LdapSettings,
) -> Vec<GiteaAccount> {
    team.users
        .values()
        .filter(|user| {
            accounts
                .get(&user.name)
                .is_none_or(|account| account.login != user.name)
        })
        .map(|user| GiteaAccount {
            id: 0,
            login: user.name.clone(),
            full_name: user
                .attr_first(&settings.user_fullname_attribute)
                .to_string(),
            email: String::new(),
        })
        .collect()
}

/// Platform accounts that are not members of the directory team.
#[must_use]
pub fn members_to_remove(
    team: &DirectoryTeam,
    accounts: &BTreeMap<String, GiteaAccount>,
) -> Vec<String> {
    accounts
        .values()
        .filter(|account| !team.users.contains_key(&account.login))
        .map(|account| account.login.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use orgsync_directory::DirectoryUser;

    fn settings() -> LdapSettings {
        orgsync_config::Config::from_yaml("gitea: {}\nldap: {}\n")
            .unwrap()
            .ldap
    }

    fn directory_team(members: &[&str]) -> DirectoryTeam {
        let users = members
            .iter()
            .map(|name| {
                let mut attributes = HashMap::new();
                attributes.insert("cn".to_string(), vec![format!("{name} full")]);
                (
                    (*name).to_string(),
                    DirectoryUser {
                        name: (*name).to_string(),
                        dn: format!("uid={name},ou=users,dc=example,dc=com"),
                        attributes,
                        admin: false,
                        restricted: false,
                    },
                )
            })
            .collect();

        DirectoryTeam {
            name: "backend".to_string(),
            dn: "cn=backend,ou=groups,dc=example,dc=com".to_string(),
            description: String::new(),
            users,
        }
    }

    fn platform_accounts(logins: &[&str]) -> BTreeMap<String, GiteaAccount> {
        logins
            .iter()
            .map(|login| {
                (
                    (*login).to_string(),
                    GiteaAccount {
                        id: 1,
                        login: (*login).to_string(),
                        full_name: String::new(),
                        email: String::new(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_diff_adds_and_removes() {
        let team = directory_team(&["alice", "bob"]);
        let accounts = platform_accounts(&["bob", "carol"]);

        let adds = members_to_add(&team, &accounts, &settings());
        assert_eq!(adds.len(), 1);
        assert_eq!(adds[0].login, "alice");
        assert_eq!(adds[0].full_name, "alice full");

        let removes = members_to_remove(&team, &accounts);
        assert_eq!(removes, vec!["carol"]);
    }

    #[test]
    fn test_identical_membership_yields_empty_diff() {
        let team = directory_team(&["alice", "bob"]);
        let accounts = platform_accounts(&["alice", "bob"]);

        assert!(members_to_add(&team, &accounts, &settings()).is_empty());
        assert!(members_to_remove(&team, &accounts).is_empty());
    }

    #[test]
    fn test_empty_platform_team_adds_everyone() {
        let team = directory_team(&["alice", "bob"]);
        let accounts = BTreeMap::new();

        let adds = members_to_add(&team, &accounts, &settings());
        assert_eq!(adds.len(), 2);
    }

    #[test]
    fn test_empty_directory_team_removes_everyone() {
        let team = directory_team(&[]);
        let accounts = platform_accounts(&["alice"]);

        assert!(members_to_add(&team, &accounts, &settings()).is_empty());
        assert_eq!(members_to_remove(&team, &accounts), vec!["alice"]);
    }
}
