//! The four-phase reconciliation engine.
//!
//! Phase order within a cycle:
//!   A. push directory users to the platform (gated on `create_groups`),
//!   B. push organizations and teams (gated on `create_groups`),
//!   C. prune platform users absent from the directory,
//!   D. walk the platform hierarchy: prune stale organizations/teams and
//!      reconcile team membership.
//!
//! The engine is stateless between cycles and aborts on the first error;
//! the next cycle recomputes everything from scratch.

use std::collections::HashSet;

use tracing::{debug, info};

use orgsync_config::Config;
use orgsync_directory::{DirectorySnapshot, DirectoryUser};
use orgsync_gitea::{
    CreateOrgOption, CreateTeamOption, CreateUserOption, EditUserOption, GiteaApi, GiteaError,
};

use crate::diff;
use crate::error::SyncResult;
use crate::exclude::{ExclusionFilter, ExclusionKind};

/// The login that must never be deleted.
const RESERVED_LOGIN: &str = "root";

/// The team every organization owner belongs to; managed by the platform.
const OWNERS_TEAM: &str = "Owners";

/// Counters for one reconciliation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub users_created: u64,
    pub users_updated: u64,
    pub users_deleted: u64,
    pub organizations_created: u64,
    pub organizations_deleted: u64,
    pub teams_created: u64,
    pub teams_deleted: u64,
    pub members_added: u64,
    pub members_removed: u64,
}

impl CycleReport {
    /// Whether the cycle changed platform state beyond the unconditional
    /// user updates.
    #[must_use]
    pub fn mutated(&self) -> bool {
        self.users_created
            + self.users_deleted
            + self.organizations_created
            + self.organizations_deleted
            + self.teams_created
            + self.teams_deleted
            + self.members_added
            + self.members_removed
            > 0
    }
}

/// Reconciliation engine over any `GiteaApi` implementation.
pub struct SyncEngine<C> {
    config: Config,
    filter: ExclusionFilter,
    api: C,
}

impl<C: GiteaApi> SyncEngine<C> {
    /// Build an engine; fails when an exclusion regex does not compile.
    pub fn new(config: Config, api: C) -> SyncResult<Self> {
        let filter = ExclusionFilter::from_settings(&config.ldap)?;
        Ok(Self {
            config,
            filter,
            api,
        })
    }

    /// Run one reconciliation cycle against the given snapshot.
    pub async fn run(&self, snapshot: &DirectorySnapshot) -> SyncResult<CycleReport> {
        let mut report = CycleReport::default();

        if self.config.sync.create_groups {
            self.sync_users(snapshot, &mut report).await?;
            self.sync_organizations(snapshot, &mut report).await?;
        } else {
            debug!("Group creation disabled, skipping push phases");
        }

        self.prune_users(snapshot, &mut report).await?;
        self.sync_hierarchy(snapshot, &mut report).await?;

        info!(
            users_created = report.users_created,
            users_updated = report.users_updated,
            users_deleted = report.users_deleted,
            organizations_created = report.organizations_created,
            organizations_deleted = report.organizations_deleted,
            teams_created = report.teams_created,
            teams_deleted = report.teams_deleted,
            members_added = report.members_added,
            members_removed = report.members_removed,
            "Reconciliation cycle finished"
        );

        Ok(report)
    }

    /// Phase A: create missing platform users and apply the configured
    /// defaults to every synced user.
    async fn sync_users(
        &self,
        snapshot: &DirectorySnapshot,
        report: &mut CycleReport,
    ) -> SyncResult<()> {
        info!("Syncing directory users to the platform");

        let existing: HashSet<String> = self
            .api
            .list_users()
            .await?
            .into_iter()
            .map(|u| u.login)
            .collect();

        for user in snapshot.users.values() {
            if self.filter.is_excluded(ExclusionKind::User, &user.name) {
                info!(user = %user.name, "User skipped (reason: exclude-list)");
                continue;
            }

            if !existing.contains(&user.name) {
                match self.api.create_user(&self.new_user_option(user)).await {
                    Ok(()) => report.users_created += 1,
                    // Lost race with another writer; the edit below still
                    // applies the desired state.
                    Err(GiteaError::AlreadyExists(_)) => {
                        debug!(user = %user.name, "User already exists");
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            // Always edit, so platform-side creation defaults never stick.
            self.api
                .edit_user(&user.name, &self.edit_user_option(user))
                .await?;
            report.users_updated += 1;
        }

        Ok(())
    }

    fn new_user_option(&self, user: &DirectoryUser) -> CreateUserOption {
        CreateUserOption {
            login_name: user.name.clone(),
            username: user.name.clone(),
            full_name: user.full_name(&self.config.ldap),
            email: user.email(&self.config.ldap),
            must_change_password: false,
            visibility: "private".to_string(),
            source_id: self.config.gitea.auth_source_id,
        }
    }

    fn edit_user_option(&self, user: &DirectoryUser) -> EditUserOption {
        let defaults = &self.config.sync.defaults.user;
        EditUserOption {
            login_name: user.name.clone(),
            email: user.email(&self.config.ldap),
            full_name: user.full_name(&self.config.ldap),
            max_repo_creation: defaults.max_repo_creation,
            allow_create_organization: defaults.allow_create_organization,
            visibility: defaults.visibility.clone(),
            admin: user.admin,
            restricted: user.restricted,
        }
    }

    /// Phase B: create missing organizations and their teams.
    async fn sync_organizations(
        &self,
        snapshot: &DirectorySnapshot,
        report: &mut CycleReport,
    ) -> SyncResult<()> {
        info!("Syncing directory groups to the platform");

        let existing_orgs: HashSet<String> = self
            .api
            .list_organizations()
            .await?
            .into_iter()
            .map(|o| o.name)
            .collect();

        for org in snapshot.organizations.values() {
            if self.filter.is_excluded(ExclusionKind::Group, &org.name) {
                info!(org = %org.name, "Group skipped (reason: exclude-list)");
                continue;
            }

            if !existing_orgs.contains(&org.name) {
                let defaults = &self.config.sync.defaults.organization;
                self.api
                    .create_organization(&CreateOrgOption {
                        username: org.name.clone(),
                        full_name: org.full_name.clone(),
                        description: org.description.clone(),
                        visibility: defaults.visibility.clone(),
                        repo_admin_change_team_access: defaults.repo_admin_change_team_access,
                    })
                    .await?;
                report.organizations_created += 1;
            }

            let existing_teams: HashSet<String> = self
                .api
                .list_teams(&org.name)
                .await?
                .into_iter()
                .map(|t| t.name)
                .collect();

            for team in org.teams.values() {
                if self.filter.is_subgroup_excluded(&team.name, &org.name) {
                    info!(org = %org.name, team = %team.name, "Subgroup skipped (reason: exclude-list)");
                    continue;
                }
                if existing_teams.contains(&team.name) {
                    continue;
                }

                let defaults = &self.config.sync.defaults.team;
                self.api
                    .create_team(
                        &org.name,
                        &CreateTeamOption {
                            name: team.name.clone(),
                            description: team.description.clone(),
                            permission: defaults.permission.clone(),
                            can_create_org_repo: defaults.can_create_org_repo,
                            includes_all_repositories: defaults.includes_all_repositories,
                            units: defaults.units.clone(),
                        },
                    )
                    .await?;
                report.teams_created += 1;
            }
        }

        Ok(())
    }

    /// Phase C: prune platform users that are absent from the directory.
    async fn prune_users(
        &self,
        snapshot: &DirectorySnapshot,
        report: &mut CycleReport,
    ) -> SyncResult<()> {
        info!("Checking platform users against the directory");

        let platform_users = self.api.list_users().await?;
        info!(
            directory = snapshot.users.len(),
            platform = platform_users.len(),
            "User counts"
        );

        for user in platform_users {
            if user.login == RESERVED_LOGIN {
                info!(user = %user.login, "User skipped (reason: reserved login)");
                continue;
            }
            if self.filter.is_excluded(ExclusionKind::User, &user.login) {
                info!(user = %user.login, "User skipped (reason: exclude-list)");
                continue;
            }
            if snapshot.users.contains_key(&user.login) {
                debug!(user = %user.login, "User exists in directory");
                continue;
            }

            if !self.config.sync.full_sync {
                debug!(user = %user.login, "User absent from directory, full sync disabled, skipping");
                continue;
            }

            info!(user = %user.login, "User absent from directory, deleting");
            self.api.delete_user(&user.login).await?;
            report.users_deleted += 1;
        }

        Ok(())
    }

    /// Phase D: prune stale organizations and teams, reconcile membership.
    async fn sync_hierarchy(
        &self,
        snapshot: &DirectorySnapshot,
        report: &mut CycleReport,
    ) -> SyncResult<()> {
        info!("Reconciling the platform organization hierarchy");

        let platform_orgs = self.api.list_organizations().await?;
        info!(
            directory = snapshot.organizations.len(),
            platform = platform_orgs.len(),
            "Organization counts"
        );

        for platform_org in platform_orgs {
            let Some(org) = snapshot.organizations.get(&platform_org.name) else {
                if !self.config.sync.full_sync {
                    debug!(org = %platform_org.name, "Organization absent from directory, full sync disabled, skipping");
                    continue;
                }

                info!(org = %platform_org.name, "Organization absent from directory, deleting");
                self.api.delete_organization(&platform_org.name).await?;
                report.organizations_deleted += 1;
                continue;
            };

            for platform_team in self.api.list_teams(&platform_org.name).await? {
                if platform_team.name == OWNERS_TEAM {
                    debug!(team = %platform_team.name, "Team skipped (reason: reserved team)");
                    continue;
                }

                let Some(team) = org.teams.get(&platform_team.name) else {
                    if !self.config.sync.full_sync {
                        debug!(team = %platform_team.name, "Team absent from directory, full sync disabled, skipping");
                        continue;
                    }

                    info!(org = %platform_org.name, team = %platform_team.name, "Team absent from directory, deleting");
                    self.api.delete_team(platform_team.id).await?;
                    report.teams_deleted += 1;
                    continue;
                };

                let accounts = self.api.list_team_members(platform_team.id).await?;
                debug!(
                    team = %platform_team.name,
                    members = accounts.len(),
                    "Diffing team membership"
                );

                let adds = diff::members_to_add(team, &accounts, &self.config.ldap);
                if !adds.is_empty() {
                    info!(team = %platform_team.name, count = adds.len(), "Adding team members");
                    self.api.add_team_members(platform_team.id, &adds).await?;
                    report.members_added += adds.len() as u64;
                }

                let removes = diff::members_to_remove(team, &accounts);
                if !removes.is_empty() {
                    info!(team = %platform_team.name, count = removes.len(), "Removing team members");
                    self.api
                        .remove_team_members(platform_team.id, &removes)
                        .await?;
                    report.members_removed += removes.len() as u64;
                }
            }
        }

        Ok(())
    }
}
