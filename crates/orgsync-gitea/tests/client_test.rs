//! Integration tests for the Gitea HTTP client: auth header, pagination
//! exhaustion, deletion ordering, and member addition matching.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use orgsync_gitea::{GiteaApi, GiteaClient, GiteaError};

fn client(server: &MockServer) -> GiteaClient {
    let config = orgsync_config::Config::from_yaml(&format!(
        r#"
gitea:
  token: test-token-123
  base_url: {}/
  auth_source_id: 1
ldap: {{}}
"#,
        server.uri()
    ))
    .unwrap();

    GiteaClient::with_http_client(&config.gitea, reqwest::Client::new())
}

fn org_json(name: &str) -> serde_json::Value {
    json!({
        "id": 1,
        "username": name,
        "full_name": format!("{name} org"),
        "description": "",
        "visibility": "private"
    })
}

fn user_json(login: &str) -> serde_json::Value {
    json!({
        "id": 7,
        "login": login,
        "full_name": format!("{login} full"),
        "email": format!("{login}@example.com"),
        "is_admin": false,
        "restricted": false
    })
}

#[tokio::test]
async fn test_list_organizations_sends_token_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/admin/orgs"))
        .and(header("Authorization", "token test-token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([org_json("eng")])))
        .expect(1)
        .mount(&server)
        .await;

    let orgs = client(&server).list_organizations().await.unwrap();

    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0].name, "eng");
    assert_eq!(orgs[0].full_name, "eng org");
}

#[tokio::test]
async fn test_list_users_exhausts_pagination() {
    let server = MockServer::start().await;

    // Page 1 is full, so a second page must be requested.
    let full_page: Vec<serde_json::Value> =
        (0..50).map(|i| user_json(&format!("user{i}"))).collect();

    Mock::given(method("GET"))
        .and(path("/api/v1/admin/users"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(full_page)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/admin/users"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user_json("last")])))
        .expect(1)
        .mount(&server)
        .await;

    let users = client(&server).list_users().await.unwrap();

    assert_eq!(users.len(), 51);
    assert_eq!(users[50].login, "last");
}

#[tokio::test]
async fn test_delete_organization_removes_repositories_first() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/orgs/eng/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "api" },
            { "id": 2, "name": "web" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/repos/eng/api"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/repos/eng/web"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/orgs/eng"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_organization("eng").await.unwrap();
}

#[tokio::test]
async fn test_delete_organization_aborts_when_repo_delete_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/orgs/eng/repos"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "api" }])),
        )
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/repos/eng/api"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    // The organization itself must not be deleted.
    Mock::given(method("DELETE"))
        .and(path("/api/v1/orgs/eng"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server).delete_organization("eng").await.unwrap_err();
    assert!(matches!(err, GiteaError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_add_team_members_adds_case_insensitive_login_matches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/search"))
        .and(query_param("q", "Alice Smith"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "data": [
                { "id": 1, "login": "ALICE", "full_name": "Alice Smith", "email": "a@example.com" },
                { "id": 2, "login": "alice-smith", "full_name": "Alice Smith", "email": "as@example.com" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Only the case-insensitive login match gets added.
    Mock::given(method("PUT"))
        .and(path("/api/v1/teams/9/members/alice"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let account = orgsync_gitea::GiteaAccount {
        id: 0,
        login: "alice".to_string(),
        full_name: "Alice Smith".to_string(),
        email: String::new(),
    };

    client(&server).add_team_members(9, &[account]).await.unwrap();
}

#[tokio::test]
async fn test_remove_team_members_deletes_each_login() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/teams/9/members/carol"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .remove_team_members(9, &["carol".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_user_posts_admin_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/admin/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(user_json("jdoe")))
        .expect(1)
        .mount(&server)
        .await;

    let user = orgsync_gitea::CreateUserOption {
        login_name: "jdoe".to_string(),
        username: "jdoe".to_string(),
        full_name: "John Doe".to_string(),
        email: "jdoe@example.com".to_string(),
        must_change_password: false,
        visibility: "private".to_string(),
        source_id: 1,
    };

    client(&server).create_user(&user).await.unwrap();
}

#[tokio::test]
async fn test_error_mapping() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/admin/users/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_string("user does not exist"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/admin/users"))
        .respond_with(
            ResponseTemplate::new(422).set_body_string("user already exists [name: jdoe]"),
        )
        .mount(&server)
        .await;

    let c = client(&server);

    let err = c.delete_user("ghost").await.unwrap_err();
    assert!(matches!(err, GiteaError::NotFound(_)));

    let user = orgsync_gitea::CreateUserOption {
        login_name: "jdoe".to_string(),
        username: "jdoe".to_string(),
        full_name: String::new(),
        email: String::new(),
        must_change_password: false,
        visibility: "private".to_string(),
        source_id: 1,
    };
    let err = c.create_user(&user).await.unwrap_err();
    assert!(matches!(err, GiteaError::AlreadyExists(_)));
}
