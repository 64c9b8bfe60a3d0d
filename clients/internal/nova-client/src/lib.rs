// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Nova (compute service) client
//!
//! Typed wrapper over the Nova v2.1 REST API. Instance creation is a
//! single accepted-and-asynchronous upstream call; callers poll
//! `get_server` until the provider publishes addresses.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the Nova client
#[derive(Error, Debug)]
pub enum NovaError {
    /// Credentials expired or rejected
    #[error("compute service rejected credentials: {0}")]
    Auth(String),

    /// Referenced server or resource does not exist
    #[error("compute service object not found: {0}")]
    NotFound(String),

    /// Any other upstream error response
    #[error("compute service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Connection-level failure; the request never took effect
    #[error("compute service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// One address entry under a server's network
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAddress {
    pub addr: String,
    /// "fixed" or "floating"
    #[serde(default, rename = "OS-EXT-IPS:type")]
    pub addr_type: Option<String>,
}

/// Flavor details embedded in server records
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddedFlavor {
    #[serde(default)]
    pub vcpus: u32,
    #[serde(default)]
    pub ram: u64,
}

/// Server as reported by Nova
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Addresses keyed by network name; empty until the provider
    /// finishes wiring the instance.
    #[serde(default)]
    pub addresses: HashMap<String, Vec<ServerAddress>>,
    #[serde(default)]
    pub flavor: EmbeddedFlavor,
}

impl Server {
    /// The instance's internal (fixed) address, if published yet.
    ///
    /// Address assignment is asynchronous on the compute side; None here
    /// means "not yet", not "never".
    pub fn fixed_address(&self) -> Option<&str> {
        self.addresses.values().flatten().find_map(|a| {
            match a.addr_type.as_deref() {
                Some("fixed") => Some(a.addr.as_str()),
                _ => None,
            }
        })
    }
}

/// Compute flavor
#[derive(Debug, Clone, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    pub vcpus: u32,
    pub ram: u64,
    pub disk: u64,
}

/// SSH keypair
#[derive(Debug, Clone, Deserialize)]
pub struct Keypair {
    pub name: String,
    pub fingerprint: String,
}

/// Compute quota set for a project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NovaQuota {
    #[serde(default = "unlimited")]
    pub instances: i64,
    #[serde(default = "unlimited")]
    pub cores: i64,
    #[serde(default = "unlimited")]
    pub ram: i64,
}

fn unlimited() -> i64 {
    -1
}

/// Quota values applied to a project
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuotaUpdate {
    pub instances: i64,
    pub cores: i64,
    pub ram: i64,
}

/// Remote console handle
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConsole {
    #[serde(rename = "type")]
    pub console_type: String,
    pub url: String,
}

// Wire envelopes.

#[derive(Serialize)]
struct ServerCreateEnvelope<'a> {
    server: ServerCreateBody<'a>,
}

#[derive(Serialize)]
struct ServerCreateBody<'a> {
    name: &'a str,
    #[serde(rename = "imageRef")]
    image_ref: &'a str,
    #[serde(rename = "flavorRef")]
    flavor_ref: &'a str,
    key_name: &'a str,
    networks: Vec<NetworkRef<'a>>,
}

#[derive(Serialize)]
struct NetworkRef<'a> {
    uuid: &'a str,
}

#[derive(Deserialize)]
struct ServerEnvelope {
    server: Server,
}

#[derive(Deserialize)]
struct ServerList {
    servers: Vec<Server>,
}

#[derive(Deserialize)]
struct FlavorList {
    flavors: Vec<Flavor>,
}

#[derive(Deserialize)]
struct KeypairItem {
    keypair: Keypair,
}

#[derive(Deserialize)]
struct KeypairList {
    keypairs: Vec<KeypairItem>,
}

#[derive(Deserialize)]
struct QuotaEnvelope {
    quota_set: NovaQuota,
}

#[derive(Serialize)]
struct QuotaUpdateEnvelope {
    quota_set: QuotaUpdate,
}

#[derive(Serialize)]
struct RemoteConsoleRequest<'a> {
    remote_console: RemoteConsoleBody<'a>,
}

#[derive(Serialize)]
struct RemoteConsoleBody<'a> {
    protocol: &'a str,
    #[serde(rename = "type")]
    console_type: &'a str,
}

#[derive(Deserialize)]
struct RemoteConsoleEnvelope {
    remote_console: RemoteConsole,
}

/// Nova API client
#[derive(Clone)]
pub struct NovaClient {
    base_url: String,
    client: reqwest::Client,
}

impl NovaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NovaError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submit instance creation. Returns as soon as the provider accepts;
    /// the returned record has no addresses yet.
    pub async fn create_server(
        &self,
        token: &str,
        name: &str,
        image_id: &str,
        flavor_id: &str,
        network_id: &str,
        key_name: &str,
    ) -> Result<Server, NovaError> {
        let body = ServerCreateEnvelope {
            server: ServerCreateBody {
                name,
                image_ref: image_id,
                flavor_ref: flavor_id,
                key_name,
                networks: vec![NetworkRef { uuid: network_id }],
            },
        };
        let resp = self
            .client
            .post(self.url("/servers"))
            .header("X-Auth-Token", token)
            .json(&body)
            .send()
            .await?;
        Ok(check(resp).await?.json::<ServerEnvelope>().await?.server)
    }

    /// Fetch one server, including its current addresses
    pub async fn get_server(&self, token: &str, server_id: &str) -> Result<Server, NovaError> {
        let resp = self
            .client
            .get(self.url(&format!("/servers/{}", server_id)))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        Ok(check(resp).await?.json::<ServerEnvelope>().await?.server)
    }

    /// List the project's servers with embedded flavor details
    pub async fn list_servers(&self, token: &str) -> Result<Vec<Server>, NovaError> {
        let resp = self
            .client
            .get(self.url("/servers/detail"))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        Ok(check(resp).await?.json::<ServerList>().await?.servers)
    }

    /// List available flavors
    pub async fn list_flavors(&self, token: &str) -> Result<Vec<Flavor>, NovaError> {
        let resp = self
            .client
            .get(self.url("/flavors/detail"))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        Ok(check(resp).await?.json::<FlavorList>().await?.flavors)
    }

    /// List the caller's keypairs
    pub async fn list_keypairs(&self, token: &str) -> Result<Vec<Keypair>, NovaError> {
        let resp = self
            .client
            .get(self.url("/os-keypairs"))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        Ok(check(resp)
            .await?
            .json::<KeypairList>()
            .await?
            .keypairs
            .into_iter()
            .map(|k| k.keypair)
            .collect())
    }

    /// Fetch the compute quota set for a project
    pub async fn get_quotas(&self, token: &str, project_id: &str) -> Result<NovaQuota, NovaError> {
        let resp = self
            .client
            .get(self.url(&format!("/os-quota-sets/{}", project_id)))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        Ok(check(resp).await?.json::<QuotaEnvelope>().await?.quota_set)
    }

    /// Apply quota values to a project
    pub async fn update_quotas(
        &self,
        token: &str,
        project_id: &str,
        quotas: QuotaUpdate,
    ) -> Result<(), NovaError> {
        let resp = self
            .client
            .put(self.url(&format!("/os-quota-sets/{}", project_id)))
            .header("X-Auth-Token", token)
            .json(&QuotaUpdateEnvelope { quota_set: quotas })
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// Open a remote console on a server
    pub async fn create_remote_console(
        &self,
        token: &str,
        server_id: &str,
        protocol: &str,
        console_type: &str,
    ) -> Result<RemoteConsole, NovaError> {
        let body = RemoteConsoleRequest {
            remote_console: RemoteConsoleBody {
                protocol,
                console_type,
            },
        };
        let resp = self
            .client
            .post(self.url(&format!("/servers/{}/remote-consoles", server_id)))
            .header("X-Auth-Token", token)
            .json(&body)
            .send()
            .await?;
        Ok(check(resp)
            .await?
            .json::<RemoteConsoleEnvelope>()
            .await?
            .remote_console)
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, NovaError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    match status.as_u16() {
        401 | 403 => Err(NovaError::Auth(message)),
        404 => Err(NovaError::NotFound(message)),
        s => Err(NovaError::Api { status: s, message }),
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
    async fn fixed_address_extraction() {
        let server: Server = serde_json::from_value(json!({
            "id": "srv-1",
            "addresses": {
                "private": [
                    {"addr": "203.0.113.7", "OS-EXT-IPS:type": "floating"},
                    {"addr": "10.0.0.5", "OS-EXT-IPS:type": "fixed"},
                ]
            }
        }))
        .unwrap();
        assert_eq!(server.fixed_address(), Some("10.0.0.5"));
    }

    #[tokio::test]
    async fn no_addresses_means_no_fixed_address() {
        let server: Server = serde_json::from_value(json!({"id": "srv-1"})).unwrap();
        assert_eq!(server.fixed_address(), None);
    }

    #[tokio::test]
    async fn create_server_round_trips() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/servers"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "server": {"id": "srv-9", "status": "BUILD"}
            })))
            .mount(&mock)
            .await;

        let client = NovaClient::new(&mock.uri(), Duration::from_secs(5)).unwrap();
        let server = client
            .create_server("tok", "alice-vm", "img-1", "flv-1", "net-1", "alice-key")
            .await
            .unwrap();
        assert_eq!(server.id, "srv-9");
        assert!(server.addresses.is_empty());
    }

    #[tokio::test]
    async fn keypair_listing_unwraps_nesting() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/os-keypairs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keypairs": [
                    {"keypair": {"name": "alice-key", "fingerprint": "aa:bb"}},
                ]
            })))
            .mount(&mock)
            .await;

        let client = NovaClient::new(&mock.uri(), Duration::from_secs(5)).unwrap();
        let keys = client.list_keypairs("tok").await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name, "alice-key");
    }
}
