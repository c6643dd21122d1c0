//! Platform API facade.
//!
//! The reconciliation engine is generic over this trait so tests can drive
//! it with an in-memory implementation. Verbs are thin: existence checks and
//! idempotence decisions live in the engine, not here.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::GiteaResult;
use crate::models::{
    CreateOrgOption, CreateTeamOption, CreateUserOption, EditUserOption, GiteaAccount,
    GiteaOrganization, GiteaTeam, GiteaUser,
};

/// Read and mutation operations the reconciliation engine needs.
#[async_trait]
pub trait GiteaApi: Send + Sync {
    /// All organizations visible to the admin token.
    async fn list_organizations(&self) -> GiteaResult<Vec<GiteaOrganization>>;

    /// Teams of one organization.
    async fn list_teams(&self, org: &str) -> GiteaResult<Vec<GiteaTeam>>;

    /// Members of one team, keyed by login.
    async fn list_team_members(&self, team_id: i64) -> GiteaResult<BTreeMap<String, GiteaAccount>>;

    /// All user accounts.
    async fn list_users(&self) -> GiteaResult<Vec<GiteaUser>>;

    /// Keyword search over user accounts.
    async fn search_users(&self, keyword: &str) -> GiteaResult<Vec<GiteaUser>>;

    async fn create_user(&self, user: &CreateUserOption) -> GiteaResult<()>;

    async fn edit_user(&self, login: &str, edit: &EditUserOption) -> GiteaResult<()>;

    async fn delete_user(&self, login: &str) -> GiteaResult<()>;

    async fn create_organization(&self, org: &CreateOrgOption) -> GiteaResult<()>;

    /// Delete an organization, removing its repositories first; the server
    /// rejects deleting an organization that still owns repositories.
    async fn delete_organization(&self, name: &str) -> GiteaResult<()>;

    async fn create_team(&self, org: &str, team: &CreateTeamOption) -> GiteaResult<()>;

    async fn delete_team(&self, team_id: i64) -> GiteaResult<()>;

    /// Add members to a team. Each candidate is resolved by a full-name
    /// keyword search; every case-insensitive login match is added.
    async fn add_team_members(&self, team_id: i64, users: &[GiteaAccount]) -> GiteaResult<()>;

    /// Remove members from a team by login.
    async fn remove_team_members(&self, team_id: i64, logins: &[String]) -> GiteaResult<()>;
}
