//! Gitea API payload models.
//!
//! Read models mirror the fields the engine consumes; unknown response
//! fields are ignored. Write models mirror the admin API option payloads.

use serde::{Deserialize, Serialize};

/// A Gitea organization as returned by the admin listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GiteaOrganization {
    #[serde(default)]
    pub id: i64,
    /// Organization name; older server versions return it as `username`.
    #[serde(alias = "username")]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub visibility: String,
}

/// A team within an organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GiteaTeam {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permission: String,
}

/// A Gitea user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GiteaUser {
    #[serde(default)]
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub restricted: bool,
}

/// The slice of a user the membership diff works with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GiteaAccount {
    pub id: i64,
    pub login: String,
    pub full_name: String,
    pub email: String,
}

impl From<GiteaUser> for GiteaAccount {
    fn from(user: GiteaUser) -> Self {
        Self {
            id: user.id,
            login: user.login,
            full_name: user.full_name,
            email: user.email,
        }
    }
}

/// A repository owned by an organization. Only the name is needed for the
/// delete-repos-before-org sequence.
#[derive(Debug, Clone, Deserialize)]
pub struct GiteaRepository {
    #[serde(default)]
    pub id: i64,
    pub name: String,
}

/// Envelope of `GET /users/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSearchResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub data: Vec<GiteaUser>,
}

/// `POST /admin/users` payload.
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserOption {
    pub login_name: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub must_change_password: bool,
    pub visibility: String,
    pub source_id: i64,
}

/// `PATCH /admin/users/{username}` payload.
#[derive(Debug, Clone, Serialize)]
pub struct EditUserOption {
    pub login_name: String,
    pub email: String,
    pub full_name: String,
    pub max_repo_creation: i64,
    pub allow_create_organization: bool,
    pub visibility: String,
    pub admin: bool,
    pub restricted: bool,
}

/// `POST /orgs` payload.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrgOption {
    pub username: String,
    pub full_name: String,
    pub description: String,
    pub visibility: String,
    pub repo_admin_change_team_access: bool,
}

/// `POST /orgs/{org}/teams` payload.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTeamOption {
    pub name: String,
    pub description: String,
    pub permission: String,
    pub can_create_org_repo: bool,
    pub includes_all_repositories: bool,
    pub units: Vec<String>,
}
