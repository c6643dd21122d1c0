//! Pure snapshot construction from raw search results.
//!
//! No I/O happens here: the builder takes the five raw result sets and the
//! attribute mapping and produces the keyed snapshot the engine consumes.

use std::collections::{BTreeMap, HashSet};

use orgsync_config::LdapSettings;
use tracing::debug;

use crate::error::{DirectoryError, DirectoryResult};
use crate::model::{
    DirectoryOrganization, DirectorySnapshot, DirectoryTeam, DirectoryUser, RawDirectory, RawEntry,
};

/// Build the directory snapshot from raw search results.
///
/// Organizations are the groups whose name does not also appear among the
/// subgroups. A subgroup becomes a team of the organization whose DN matches
/// one of its `memberOf` values (case-insensitive); its members are resolved
/// by matching `member` values against user DNs (case-insensitive). Duplicate
/// keys at any level are an error rather than a silent overwrite.
pub fn build_snapshot(
    raw: &RawDirectory,
    settings: &LdapSettings,
) -> DirectoryResult<DirectorySnapshot> {
    let mut snapshot = DirectorySnapshot::default();

    build_users(&mut snapshot, raw, settings)?;
    build_organizations(&mut snapshot, raw, settings)?;

    debug!(
        organizations = snapshot.organizations.len(),
        users = snapshot.users.len(),
        "Directory snapshot built"
    );

    Ok(snapshot)
}

fn build_users(
    snapshot: &mut DirectorySnapshot,
    raw: &RawDirectory,
    settings: &LdapSettings,
) -> DirectoryResult<()> {
    let admin_names: HashSet<&str> = raw
        .admins
        .iter()
        .map(|e| e.attr_first(&settings.user_username_attribute))
        .collect();
    let restricted_names: HashSet<&str> = raw
        .restricted
        .iter()
        .map(|e| e.attr_first(&settings.user_username_attribute))
        .collect();

    for entry in &raw.users {
        let name = entry.attr_first(&settings.user_username_attribute);
        let admin = !settings.admin_filter.is_empty() && admin_names.contains(name);
        let restricted =
            !settings.restricted_filter.is_empty() && restricted_names.contains(name);

        let user = resolve_user(entry, settings, admin, restricted);
        if snapshot.users.insert(user.name.clone(), user).is_some() {
            return Err(DirectoryError::DuplicateKey {
                kind: "user",
                name: name.to_string(),
            });
        }
    }

    Ok(())
}

fn build_organizations(
    snapshot: &mut DirectorySnapshot,
    raw: &RawDirectory,
    settings: &LdapSettings,
) -> DirectoryResult<()> {
    let subgroup_names: HashSet<&str> = raw
        .subgroups
        .iter()
        .map(|e| e.attr_first(&settings.group_name_attribute))
        .collect();

    for group in &raw.groups {
        let name = group.attr_first(&settings.group_name_attribute);
        if subgroup_names.contains(name) {
            continue;
        }

        let mut teams = BTreeMap::new();
        for subgroup in &raw.subgroups {
            let belongs = subgroup
                .attr_all("memberOf")
                .iter()
                .any(|parent_dn| parent_dn.eq_ignore_ascii_case(&group.dn));
            if !belongs {
                continue;
            }

            let team = resolve_team(subgroup, name, raw, settings)?;
            let team_name = team.name.clone();
            if teams.insert(team_name.clone(), team).is_some() {
                return Err(DirectoryError::DuplicateKey {
                    kind: "team",
                    name: team_name,
                });
            }
        }

        let organization = DirectoryOrganization {
            name: name.to_string(),
            dn: group.dn.clone(),
            full_name: group.attr_first(&settings.group_fullname_attribute).to_string(),
            description: group
                .attr_first(&settings.group_description_attribute)
                .to_string(),
            teams,
        };

        if snapshot
            .organizations
            .insert(organization.name.clone(), organization)
            .is_some()
        {
            return Err(DirectoryError::DuplicateKey {
                kind: "organization",
                name: name.to_string(),
            });
        }
    }

    Ok(())
}

fn resolve_team(
    subgroup: &RawEntry,
    parent_name: &str,
    raw: &RawDirectory,
    settings: &LdapSettings,
) -> DirectoryResult<DirectoryTeam> {
    let mut users = BTreeMap::new();
    for member_dn in subgroup.attr_all("member") {
        for user_entry in &raw.users {
            if member_dn.eq_ignore_ascii_case(&user_entry.dn) {
                let name = user_entry.attr_first(&settings.user_username_attribute);
                // Flags are resolved from the user registry later; team
                // membership only needs the identity mapping.
                users.insert(
                    name.to_string(),
                    resolve_user(user_entry, settings, false, false),
                );
            }
        }
    }

    let mut name = subgroup
        .attr_first(&settings.subgroup_name_attribute)
        .to_string();
    if settings.trim_parent_name {
        name = trim_parent_prefix(&name, parent_name, &settings.subgroup_separator);
    }

    Ok(DirectoryTeam {
        name,
        dn: subgroup.dn.clone(),
        description: subgroup
            .attr_first(&settings.subgroup_description_attribute)
            .to_string(),
        users,
    })
}

fn resolve_user(
    entry: &RawEntry,
    settings: &LdapSettings,
    admin: bool,
    restricted: bool,
) -> DirectoryUser {
    DirectoryUser {
        name: entry.attr_first(&settings.user_username_attribute).to_string(),
        dn: entry.dn.clone(),
        attributes: entry.attributes.clone(),
        admin,
        restricted,
    }
}

/// Strip the `{parent}{separator}` prefix from a team name.
///
/// Names that do not carry the prefix are left unchanged, including names
/// that contain the separator in another position.
fn trim_parent_prefix(name: &str, parent: &str, separator: &str) -> String {
    let prefix = format!("{parent}{separator}");
    name.strip_prefix(&prefix).unwrap_or(name).to_string()
}
