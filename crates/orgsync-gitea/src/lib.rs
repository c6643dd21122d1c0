//! Gitea platform access for orgsync.
//!
//! The `GiteaApi` trait is the seam between the reconciliation engine and
//! the platform: the engine only sees trait verbs, the `GiteaClient`
//! implementation talks to a real instance over its REST API.

mod api;
mod client;
mod error;
mod models;

pub use api::GiteaApi;
pub use client::GiteaClient;
pub use error::{GiteaError, GiteaResult};
pub use models::{
    CreateOrgOption, CreateTeamOption, CreateUserOption, EditUserOption, GiteaAccount,
    GiteaOrganization, GiteaRepository, GiteaTeam, GiteaUser, UserSearchResponse,
};
