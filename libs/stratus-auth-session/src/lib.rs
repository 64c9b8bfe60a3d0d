// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Application session tokens
//!
//! A session is an HS256 JWT wrapping the identity provider's token plus
//! the resolved caller identity. The gateway verifies the JWT on every
//! request and forwards the wrapped provider token upstream; the provider
//! remains the authority on whether that inner token is still good.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from session issuance and verification
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session expired; the caller must log in again
    #[error("session expired")]
    Expired,

    /// Token malformed, tampered with, or signed with a different key
    #[error("invalid session token: {0}")]
    Invalid(String),

    /// Token could not be produced
    #[error("failed to issue session token: {0}")]
    Encode(String),
}

/// The caller identity a session resolves to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub user_id: String,
    pub user_name: String,
    pub project_id: String,
    pub project_name: String,
    pub region: String,
    /// The wrapped identity-provider token, forwarded on upstream calls
    pub keystone_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(flatten)]
    profile: Profile,
}

/// Issues and verifies session tokens with a single shared secret
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    /// Issue a session for a resolved profile.
    ///
    /// The session never outlives the wrapped provider token: expiry is
    /// the earlier of now+ttl and `provider_expiry`.
    pub fn issue(
        &self,
        profile: Profile,
        provider_expiry: Option<DateTime<Utc>>,
    ) -> Result<(String, DateTime<Utc>), SessionError> {
        let now = Utc::now();
        let mut expires_at = now + self.ttl;
        if let Some(provider) = provider_expiry {
            if provider < expires_at {
                expires_at = provider;
            }
        }
        let claims = Claims {
            sub: profile.user_id.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            profile,
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SessionError::Encode(e.to_string()))?;
        Ok((token, expires_at))
    }

    /// Verify a session token and recover the profile inside it
    pub fn verify(&self, token: &str) -> Result<Profile, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid(e.to_string()),
            },
        )?;
        Ok(data.claims.profile)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn profile() -> Profile {
        Profile {
            user_id: "u-1".to_string(),
            user_name: "alice".to_string(),
            project_id: "p-1".to_string(),
            project_name: "alice-project".to_string(),
            region: "RegionOne".to_string(),
            keystone_token: "gAAAAA-upstream".to_string(),
        }
    }

    fn manager(secret: &str, ttl_secs: i64) -> SessionManager {
        SessionManager::new(&SecretString::from(secret.to_string()), Duration::seconds(ttl_secs))
    }

    #[test]
    fn round_trip() {
        let mgr = manager("test-secret", 3600);
        let (token, expires_at) = mgr.issue(profile(), None).unwrap();
        assert!(expires_at > Utc::now());
        let recovered = mgr.verify(&token).unwrap();
        assert_eq!(recovered, profile());
    }

    #[test]
    fn provider_expiry_caps_session_lifetime() {
        let mgr = manager("test-secret", 3600);
        let provider_expiry = Utc::now() + Duration::seconds(60);
        let (_, expires_at) = mgr.issue(profile(), Some(provider_expiry)).unwrap();
        assert!(expires_at <= provider_expiry);
    }

    #[test]
    fn expired_session_is_rejected() {
        let mgr = manager("test-secret", -10);
        let (token, _) = mgr.issue(profile(), None).unwrap();
        assert!(matches!(mgr.verify(&token), Err(SessionError::Expired)));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let issued = manager("secret-a", 3600).issue(profile(), None).unwrap().0;
        assert!(matches!(
            manager("secret-b", 3600).verify(&issued),
            Err(SessionError::Invalid(_))
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let mgr = manager("test-secret", 3600);
        let (token, _) = mgr.issue(profile(), None).unwrap();
        let tampered = format!("{}x", token);
        assert!(matches!(mgr.verify(&tampered), Err(SessionError::Invalid(_))));
    }
}
