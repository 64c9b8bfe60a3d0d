// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Cinder (volume service) client
//!
//! Read-mostly: volume/snapshot listings and quota reads feed the
//! gateway's usage aggregation; the one write is the default-quota
//! assignment for freshly provisioned projects.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the Cinder client
#[derive(Error, Debug)]
pub enum CinderError {
    #[error("volume service rejected credentials: {0}")]
    Auth(String),

    #[error("volume service object not found: {0}")]
    NotFound(String),

    #[error("volume service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("volume service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Volume as reported by Cinder
#[derive(Debug, Clone, Deserialize)]
pub struct Volume {
    pub id: String,
    /// Size in GB
    pub size: u64,
}

/// Volume snapshot
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    pub id: String,
}

/// Volume quota set for a project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CinderQuota {
    #[serde(default = "unlimited")]
    pub volumes: i64,
    #[serde(default = "unlimited")]
    pub snapshots: i64,
    #[serde(default = "unlimited")]
    pub gigabytes: i64,
}

fn unlimited() -> i64 {
    -1
}

#[derive(Deserialize)]
struct VolumeList {
    volumes: Vec<Volume>,
}

#[derive(Deserialize)]
struct SnapshotList {
    snapshots: Vec<Snapshot>,
}

#[derive(Deserialize)]
struct QuotaEnvelope {
    quota_set: CinderQuota,
}

#[derive(Serialize)]
struct QuotaUpdateEnvelope {
    quota_set: QuotaUpdateBody,
}

#[derive(Serialize)]
struct QuotaUpdateBody {
    gigabytes: i64,
}

/// Cinder API client
///
/// Cinder paths embed the caller's project ID.
#[derive(Clone)]
pub struct CinderClient {
    base_url: String,
    client: reqwest::Client,
}

impl CinderClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CinderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, project_id: &str, path: &str) -> String {
        format!("{}/v3/{}{}", self.base_url, project_id, path)
    }

    /// List the project's volumes
    pub async fn list_volumes(
        &self,
        token: &str,
        project_id: &str,
    ) -> Result<Vec<Volume>, CinderError> {
        let resp = self
            .client
            .get(self.url(project_id, "/volumes/detail"))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        Ok(check(resp).await?.json::<VolumeList>().await?.volumes)
    }

    /// List the project's volume snapshots
    pub async fn list_snapshots(
        &self,
        token: &str,
        project_id: &str,
    ) -> Result<Vec<Snapshot>, CinderError> {
        let resp = self
            .client
            .get(self.url(project_id, "/snapshots/detail"))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        Ok(check(resp).await?.json::<SnapshotList>().await?.snapshots)
    }

    /// Fetch the volume quota set for a project
    pub async fn get_quotas(
        &self,
        token: &str,
        project_id: &str,
    ) -> Result<CinderQuota, CinderError> {
        let resp = self
            .client
            .get(self.url(project_id, &format!("/os-quota-sets/{}", project_id)))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        Ok(check(resp).await?.json::<QuotaEnvelope>().await?.quota_set)
    }

    /// Apply a storage quota to a project
    pub async fn update_gigabytes_quota(
        &self,
        token: &str,
        admin_project_id: &str,
        target_project_id: &str,
        gigabytes: i64,
    ) -> Result<(), CinderError> {
        let resp = self
            .client
            .put(self.url(admin_project_id, &format!("/os-quota-sets/{}", target_project_id)))
            .header("X-Auth-Token", token)
            .json(&QuotaUpdateEnvelope {
                quota_set: QuotaUpdateBody { gigabytes },
            })
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, CinderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    match status.as_u16() {
        401 | 403 => Err(CinderError::Auth(message)),
        404 => Err(CinderError::NotFound(message)),
        s => Err(CinderError::Api { status: s, message }),
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
    async fn volume_listing_carries_sizes() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/p-1/volumes/detail"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "volumes": [{"id": "vol-1", "size": 20}, {"id": "vol-2", "size": 80}]
            })))
            .mount(&mock)
            .await;

        let client = CinderClient::new(&mock.uri(), Duration::from_secs(5)).unwrap();
        let volumes = client.list_volumes("tok", "p-1").await.unwrap();
        let total: u64 = volumes.iter().map(|v| v.size).sum();
        assert_eq!(total, 100);
    }
}
