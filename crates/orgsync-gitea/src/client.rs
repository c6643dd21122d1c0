//! Gitea HTTP client (reqwest-based).
//!
//! Wraps `reqwest::Client` with token authentication, pagination
//! exhaustion, and error mapping for the admin and organization APIs.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use orgsync_config::GiteaSettings;

use crate::api::GiteaApi;
use crate::error::{GiteaError, GiteaResult};
use crate::models::{
    CreateOrgOption, CreateTeamOption, CreateUserOption, EditUserOption, GiteaAccount,
    GiteaOrganization, GiteaRepository, GiteaTeam, GiteaUser, UserSearchResponse,
};

/// Page size for listing endpoints; pages are fetched until exhausted.
const PAGE_LIMIT: usize = 50;

/// Gitea API client for one configured instance.
#[derive(Debug, Clone)]
pub struct GiteaClient {
    base_url: String,
    token: String,
    http_client: Client,
}

impl GiteaClient {
    /// Create a client from the configured endpoint and token.
    pub fn new(settings: &GiteaSettings) -> GiteaResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.client_timeout_secs))
            .user_agent(concat!("orgsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GiteaError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(settings, http_client))
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(settings: &GiteaSettings, http_client: Client) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Authorization", format!("token {}", self.token))
    }

    /// Fetch every page of a listing endpoint.
    async fn list_paginated<T: DeserializeOwned>(&self, path: &str) -> GiteaResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let builder = self
                .http_client
                .get(self.url(path))
                .query(&[("page", page.to_string()), ("limit", PAGE_LIMIT.to_string())]);
            let response = self.authorize(builder).send().await?;
            let batch: Vec<T> = handle_response(response).await?;

            let batch_len = batch.len();
            items.extend(batch);

            if batch_len < PAGE_LIMIT {
                return Ok(items);
            }
            page += 1;
        }
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> GiteaResult<()> {
        let builder = self.http_client.post(self.url(path)).json(body);
        let response = self.authorize(builder).send().await?;
        handle_empty_response(response).await
    }

    async fn patch_json<B: Serialize>(&self, path: &str, body: &B) -> GiteaResult<()> {
        let builder = self.http_client.patch(self.url(path)).json(body);
        let response = self.authorize(builder).send().await?;
        handle_empty_response(response).await
    }

    async fn put(&self, path: &str) -> GiteaResult<()> {
        let response = self.authorize(self.http_client.put(self.url(path))).send().await?;
        handle_empty_response(response).await
    }

    async fn delete(&self, path: &str) -> GiteaResult<()> {
        let response = self
            .authorize(self.http_client.delete(self.url(path)))
            .send()
            .await?;
        handle_empty_response(response).await
    }
}

#[async_trait]
impl GiteaApi for GiteaClient {
    async fn list_organizations(&self) -> GiteaResult<Vec<GiteaOrganization>> {
        debug!("Listing organizations");
        self.list_paginated("/admin/orgs").await
    }

    async fn list_teams(&self, org: &str) -> GiteaResult<Vec<GiteaTeam>> {
        debug!(org = %org, "Listing teams");
        self.list_paginated(&format!("/orgs/{org}/teams")).await
    }

    async fn list_team_members(&self, team_id: i64) -> GiteaResult<BTreeMap<String, GiteaAccount>> {
        debug!(team_id, "Listing team members");
        let users: Vec<GiteaUser> = self
            .list_paginated(&format!("/teams/{team_id}/members"))
            .await?;

        Ok(users
            .into_iter()
            .map(|user| (user.login.clone(), GiteaAccount::from(user)))
            .collect())
    }

    async fn list_users(&self) -> GiteaResult<Vec<GiteaUser>> {
        debug!("Listing users");
        self.list_paginated("/admin/users").await
    }

    async fn search_users(&self, keyword: &str) -> GiteaResult<Vec<GiteaUser>> {
        debug!(keyword = %keyword, "Searching users");

        let mut users = Vec::new();
        let mut page = 1usize;

        loop {
            let builder = self.http_client.get(self.url("/users/search")).query(&[
                ("q", keyword.to_string()),
                ("page", page.to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ]);
            let response = self.authorize(builder).send().await?;
            let batch: UserSearchResponse = handle_response(response).await?;

            let batch_len = batch.data.len();
            users.extend(batch.data);

            if batch_len < PAGE_LIMIT {
                return Ok(users);
            }
            page += 1;
        }
    }

    async fn create_user(&self, user: &CreateUserOption) -> GiteaResult<()> {
        self.post_json("/admin/users", user).await?;
        info!(login = %user.username, "User created");
        Ok(())
    }

    async fn edit_user(&self, login: &str, edit: &EditUserOption) -> GiteaResult<()> {
        self.patch_json(&format!("/admin/users/{login}"), edit).await?;
        info!(login = %login, "User updated");
        Ok(())
    }

    async fn delete_user(&self, login: &str) -> GiteaResult<()> {
        self.delete(&format!("/admin/users/{login}")).await?;
        info!(login = %login, "User deleted");
        Ok(())
    }

    async fn create_organization(&self, org: &CreateOrgOption) -> GiteaResult<()> {
        self.post_json("/orgs", org).await?;
        info!(org = %org.username, "Organization created");
        Ok(())
    }

    async fn delete_organization(&self, name: &str) -> GiteaResult<()> {
        let repos: Vec<GiteaRepository> =
            self.list_paginated(&format!("/orgs/{name}/repos")).await?;

        for repo in repos {
            self.delete(&format!("/repos/{name}/{}", repo.name)).await?;
            info!(org = %name, repo = %repo.name, "Repository deleted");
        }

        self.delete(&format!("/orgs/{name}")).await?;
        info!(org = %name, "Organization deleted");
        Ok(())
    }

    async fn create_team(&self, org: &str, team: &CreateTeamOption) -> GiteaResult<()> {
        self.post_json(&format!("/orgs/{org}/teams"), team).await?;
        info!(org = %org, team = %team.name, "Team created");
        Ok(())
    }

    async fn delete_team(&self, team_id: i64) -> GiteaResult<()> {
        self.delete(&format!("/teams/{team_id}")).await?;
        info!(team_id, "Team deleted");
        Ok(())
    }

    async fn add_team_members(&self, team_id: i64, users: &[GiteaAccount]) -> GiteaResult<()> {
        debug!(team_id, count = users.len(), "Adding users to team");

        for user in users {
            let matches = self.search_users(&user.full_name).await?;
            for found in matches {
                if !found.login.eq_ignore_ascii_case(&user.login) {
                    continue;
                }

                self.put(&format!("/teams/{team_id}/members/{}", user.login))
                    .await?;
                info!(team_id, login = %user.login, "User added to team");
            }
        }

        Ok(())
    }

    async fn remove_team_members(&self, team_id: i64, logins: &[String]) -> GiteaResult<()> {
        debug!(team_id, count = logins.len(), "Removing users from team");

        for login in logins {
            self.delete(&format!("/teams/{team_id}/members/{login}"))
                .await?;
            info!(team_id, login = %login, "User removed from team");
        }

        Ok(())
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> GiteaResult<T> {
    let status = response.status();

    if status.is_success() {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GiteaError::Parse(e.to_string()))
    } else {
        Err(error_from_response(status, response).await)
    }
}

async fn handle_empty_response(response: Response) -> GiteaResult<()> {
    let status = response.status();

    if status.is_success() {
        Ok(())
    } else {
        Err(error_from_response(status, response).await)
    }
}

async fn error_from_response(status: StatusCode, response: Response) -> GiteaError {
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());

    match status {
        StatusCode::NOT_FOUND => GiteaError::NotFound(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GiteaError::Auth(body),
        StatusCode::CONFLICT => GiteaError::AlreadyExists(body),
        StatusCode::UNPROCESSABLE_ENTITY if body.contains("already exists") => {
            GiteaError::AlreadyExists(body)
        }
        _ => GiteaError::Api {
            status: status.as_u16(),
            detail: if body.is_empty() {
                format!("HTTP {status}")
            } else {
                body
            },
        },
    }
}
