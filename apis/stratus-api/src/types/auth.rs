// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Login, signup, and session types

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Password login request
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginRequest {
    /// Identity provider username
    pub username: String,
    /// Password
    pub password: String,
    /// Identity domain. Defaults to "Default" if omitted.
    #[serde(default)]
    pub domain: Option<String>,
    /// Region to scope the session to. Defaults to the gateway's
    /// configured region if omitted.
    #[serde(default)]
    pub region: Option<String>,
}

/// Resolved caller identity carried by a session
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionProfile {
    /// Identity provider user ID
    pub user_id: String,
    /// Username
    pub user_name: String,
    /// Project the session is scoped to
    pub project_id: String,
    /// Project name
    pub project_name: String,
    /// Region the session is scoped to
    pub region: String,
    /// Session expiry
    pub expires_at: DateTime<Utc>,
}

/// Login response
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LoginResponse {
    /// Application session token (bearer)
    pub token: String,
    /// Caller identity resolved from the identity provider
    pub profile: SessionProfile,
}

/// Account signup request
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SignupRequest {
    /// Desired username
    pub username: String,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Password
    pub password: String,
}

/// Account signup response
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SignupResponse {
    /// ID of the project provisioned for the new account
    pub project_id: String,
    /// ID of the new user
    pub user_id: String,
}
