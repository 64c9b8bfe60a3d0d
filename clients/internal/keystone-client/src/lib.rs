// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Keystone (identity service) client
//!
//! Password authentication plus the project/user/role provisioning calls
//! the signup path needs. Deletion calls exist for the compensation path:
//! partially provisioned accounts are rolled back in reverse order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the Keystone client
#[derive(Error, Debug)]
pub enum KeystoneError {
    /// Bad credentials or an expired/invalid token
    #[error("identity service rejected credentials: {0}")]
    Auth(String),

    /// Referenced project, user, or role does not exist
    #[error("identity service object not found: {0}")]
    NotFound(String),

    /// Name already taken (duplicate project or user)
    #[error("identity service conflict: {0}")]
    Conflict(String),

    /// Any other upstream error response
    #[error("identity service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Connection-level failure; the request never took effect
    #[error("identity service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Success response missing a required field
    #[error("identity service response malformed: {0}")]
    Malformed(String),
}

/// Project reference inside a token scope
#[derive(Debug, Clone, Deserialize)]
pub struct ScopedProject {
    pub id: String,
    pub name: String,
}

/// A token issued by Keystone, with the identity it resolves to
#[derive(Debug, Clone)]
pub struct TokenInfo {
    /// The raw token value (sent upstream as X-Auth-Token)
    pub token: String,
    pub user_id: String,
    pub user_name: String,
    /// Scope, when the token is project-scoped
    pub project: Option<ScopedProject>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Provisioned project
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

/// Provisioned user
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

// Wire shapes for the v3 password grant.

#[derive(Serialize)]
struct AuthEnvelope<'a> {
    auth: AuthBody<'a>,
}

#[derive(Serialize)]
struct AuthBody<'a> {
    identity: Identity<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<Scope<'a>>,
}

#[derive(Serialize)]
struct Identity<'a> {
    methods: [&'a str; 1],
    password: PasswordMethod<'a>,
}

#[derive(Serialize)]
struct PasswordMethod<'a> {
    user: PasswordUser<'a>,
}

#[derive(Serialize)]
struct PasswordUser<'a> {
    name: &'a str,
    domain: DomainRef<'a>,
    password: &'a str,
}

#[derive(Serialize)]
struct DomainRef<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct Scope<'a> {
    project: ScopeProject<'a>,
}

#[derive(Serialize)]
struct ScopeProject<'a> {
    name: &'a str,
    domain: DomainRef<'a>,
}

#[derive(Deserialize)]
struct TokenEnvelope {
    token: TokenBody,
}

#[derive(Deserialize)]
struct TokenBody {
    user: TokenUser,
    #[serde(default)]
    project: Option<ScopedProject>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct ProjectCreateEnvelope<'a> {
    project: ProjectCreateBody<'a>,
}

#[derive(Serialize)]
struct ProjectCreateBody<'a> {
    name: &'a str,
    description: &'a str,
    domain_id: &'a str,
    enabled: bool,
}

#[derive(Deserialize)]
struct ProjectEnvelope {
    project: Project,
}

#[derive(Serialize)]
struct UserCreateEnvelope<'a> {
    user: UserCreateBody<'a>,
}

#[derive(Serialize)]
struct UserCreateBody<'a> {
    name: &'a str,
    description: &'a str,
    domain_id: &'a str,
    password: &'a str,
    default_project_id: &'a str,
    email: &'a str,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

/// Keystone API client
#[derive(Clone)]
pub struct KeystoneClient {
    base_url: String,
    client: reqwest::Client,
}

impl KeystoneClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, KeystoneError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Password authentication, optionally scoped to a project by name.
    ///
    /// The issued token arrives in the `X-Subject-Token` response header;
    /// the body carries the resolved identity and scope.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        domain: &str,
        project_name: Option<&str>,
    ) -> Result<TokenInfo, KeystoneError> {
        let body = AuthEnvelope {
            auth: AuthBody {
                identity: Identity {
                    methods: ["password"],
                    password: PasswordMethod {
                        user: PasswordUser {
                            name: username,
                            domain: DomainRef { name: domain },
                            password,
                        },
                    },
                },
                scope: project_name.map(|name| Scope {
                    project: ScopeProject {
                        name,
                        domain: DomainRef { name: domain },
                    },
                }),
            },
        };
        let resp = self
            .client
            .post(self.url("/v3/auth/tokens"))
            .json(&body)
            .send()
            .await?;
        let resp = check(resp).await?;
        let token = resp
            .headers()
            .get("X-Subject-Token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                KeystoneError::Malformed("missing X-Subject-Token header".to_string())
            })?;
        let envelope = resp.json::<TokenEnvelope>().await?;
        Ok(TokenInfo {
            token,
            user_id: envelope.token.user.id,
            user_name: envelope.token.user.name,
            project: envelope.token.project,
            expires_at: envelope.token.expires_at,
        })
    }

    /// Create a project
    pub async fn create_project(
        &self,
        token: &str,
        name: &str,
        description: &str,
        domain_id: &str,
    ) -> Result<Project, KeystoneError> {
        let body = ProjectCreateEnvelope {
            project: ProjectCreateBody {
                name,
                description,
                domain_id,
                enabled: true,
            },
        };
        let resp = self
            .client
            .post(self.url("/v3/projects"))
            .header("X-Auth-Token", token)
            .json(&body)
            .send()
            .await?;
        Ok(check(resp).await?.json::<ProjectEnvelope>().await?.project)
    }

    /// Create a user with a default project
    pub async fn create_user(
        &self,
        token: &str,
        name: &str,
        password: &str,
        email: &str,
        description: &str,
        domain_id: &str,
        default_project_id: &str,
    ) -> Result<User, KeystoneError> {
        let body = UserCreateEnvelope {
            user: UserCreateBody {
                name,
                description,
                domain_id,
                password,
                default_project_id,
                email,
            },
        };
        let resp = self
            .client
            .post(self.url("/v3/users"))
            .header("X-Auth-Token", token)
            .json(&body)
            .send()
            .await?;
        Ok(check(resp).await?.json::<UserEnvelope>().await?.user)
    }

    /// Grant a role to a user on a project
    pub async fn assign_project_role(
        &self,
        token: &str,
        project_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), KeystoneError> {
        let resp = self
            .client
            .put(self.url(&format!(
                "/v3/projects/{}/users/{}/roles/{}",
                project_id, user_id, role_id
            )))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// Delete a project (compensation path)
    pub async fn delete_project(&self, token: &str, project_id: &str) -> Result<(), KeystoneError> {
        let resp = self
            .client
            .delete(self.url(&format!("/v3/projects/{}", project_id)))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// Delete a user (compensation path)
    pub async fn delete_user(&self, token: &str, user_id: &str) -> Result<(), KeystoneError> {
        let resp = self
            .client
            .delete(self.url(&format!("/v3/users/{}", user_id)))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, KeystoneError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    match status.as_u16() {
        401 | 403 => Err(KeystoneError::Auth(message)),
        404 => Err(KeystoneError::NotFound(message)),
        409 => Err(KeystoneError::Conflict(message)),
        s => Err(KeystoneError::Api { status: s, message }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn authenticate_reads_subject_token_header() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("X-Subject-Token", "gAAAAA-token")
                    .set_body_json(json!({
                        "token": {
                            "user": {"id": "u-1", "name": "alice"},
                            "project": {"id": "p-1", "name": "alice-project"},
                            "expires_at": "2026-08-07T12:00:00Z",
                        }
                    })),
            )
            .mount(&mock)
            .await;

        let client = KeystoneClient::new(&mock.uri(), Duration::from_secs(5)).unwrap();
        let info = client
            .authenticate("alice", "hunter2", "Default", Some("alice-project"))
            .await
            .unwrap();
        assert_eq!(info.token, "gAAAAA-token");
        assert_eq!(info.user_id, "u-1");
        assert_eq!(info.project.unwrap().id, "p-1");
        assert!(info.expires_at.is_some());
    }

    #[tokio::test]
    async fn bad_password_maps_to_auth_error() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
            .mount(&mock)
            .await;

        let client = KeystoneClient::new(&mock.uri(), Duration::from_secs(5)).unwrap();
        let err = client
            .authenticate("alice", "wrong", "Default", None)
            .await
            .unwrap_err();
        assert!(matches!(err, KeystoneError::Auth(_)));
    }

    #[tokio::test]
    async fn duplicate_user_maps_to_conflict() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/users"))
            .respond_with(ResponseTemplate::new(409).set_body_string("Duplicate entry"))
            .mount(&mock)
            .await;

        let client = KeystoneClient::new(&mock.uri(), Duration::from_secs(5)).unwrap();
        let err = client
            .create_user("tok", "alice", "pw", "a@example.org", "", "default", "p-1")
            .await
            .unwrap_err();
        assert!(matches!(err, KeystoneError::Conflict(_)));
    }
}
