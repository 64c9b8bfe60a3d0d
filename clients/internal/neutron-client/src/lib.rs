// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Neutron (network service) client
//!
//! A thin typed wrapper over the Neutron v2.0 REST API: one method per
//! upstream call, status-code-driven error mapping at the boundary, and
//! no retry logic (retries are a caller policy decision). This crate is
//! the only place in the workspace that talks to the network provider.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the Neutron client
///
/// Transport failures carry no upstream side effect and are safe for the
/// caller to retry; everything else reflects an upstream decision.
#[derive(Error, Debug)]
pub enum NeutronError {
    /// Credentials expired or rejected
    #[error("network service rejected credentials: {0}")]
    Auth(String),

    /// Referenced floating IP or rule does not exist
    #[error("network service object not found: {0}")]
    NotFound(String),

    /// Upstream rejected a duplicate (floating IP, external port, protocol)
    #[error("network service conflict: {0}")]
    Conflict(String),

    /// Any other upstream error response
    #[error("network service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Connection-level failure; the request never took effect
    #[error("network service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Transport protocol of a port-forwarding rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

/// Floating IP as reported by Neutron
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingIp {
    pub id: String,
    pub floating_ip_address: String,
    /// Owning project
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Port the address is attached to; None means unattached
    #[serde(default)]
    pub port_id: Option<String>,
    #[serde(default)]
    pub fixed_ip_address: Option<String>,
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Port-forwarding rule as reported by Neutron
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortForwarding {
    pub id: String,
    pub protocol: Protocol,
    pub internal_ip_address: String,
    pub internal_port: u16,
    pub external_port: u16,
    #[serde(default)]
    pub status: Option<String>,
}

/// Network quota set for a project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NeutronQuota {
    #[serde(default = "unlimited")]
    pub floatingip: i64,
    #[serde(default = "unlimited")]
    pub network: i64,
    #[serde(default = "unlimited")]
    pub port: i64,
    #[serde(default = "unlimited")]
    pub router: i64,
    #[serde(default = "unlimited")]
    pub subnet: i64,
    #[serde(default = "unlimited")]
    pub security_group: i64,
    #[serde(default = "unlimited")]
    pub security_group_rule: i64,
}

fn unlimited() -> i64 {
    -1
}

/// Network as reported by Neutron
#[derive(Debug, Clone, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub subnets: Vec<String>,
}

/// Identifier-only record for resources the gateway only ever counts
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    pub id: String,
}

// Wire envelopes. Neutron wraps every payload in a singular or plural
// resource key.

#[derive(Deserialize)]
struct FloatingIpList {
    floatingips: Vec<FloatingIp>,
}

#[derive(Deserialize)]
struct FloatingIpEnvelope {
    floatingip: FloatingIp,
}

#[derive(Deserialize)]
struct PortForwardingList {
    port_forwardings: Vec<PortForwarding>,
}

#[derive(Deserialize)]
struct PortForwardingEnvelope {
    port_forwarding: PortForwarding,
}

#[derive(Serialize)]
struct PortForwardingCreateEnvelope<'a> {
    port_forwarding: PortForwardingCreateBody<'a>,
}

#[derive(Serialize)]
struct PortForwardingCreateBody<'a> {
    protocol: Protocol,
    internal_ip_address: &'a str,
    internal_port: u16,
    external_port: u16,
}

#[derive(Deserialize)]
struct NetworkList {
    networks: Vec<Network>,
}

#[derive(Deserialize)]
struct QuotaEnvelope {
    quota: NeutronQuota,
}

/// Neutron API client
#[derive(Clone)]
pub struct NeutronClient {
    base_url: String,
    client: reqwest::Client,
}

impl NeutronClient {
    /// Create a client for the given Neutron endpoint.
    ///
    /// Callers pass their own token per request; the client itself holds
    /// no credentials.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NeutronError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Enumerate floating IPs, optionally filtered to one owning project
    pub async fn list_floating_ips(
        &self,
        token: &str,
        tenant_id: Option<&str>,
    ) -> Result<Vec<FloatingIp>, NeutronError> {
        let mut req = self
            .client
            .get(self.url("/v2.0/floatingips"))
            .header("X-Auth-Token", token);
        if let Some(tenant) = tenant_id {
            req = req.query(&[("tenant_id", tenant)]);
        }
        let resp = check(req.send().await?).await?;
        Ok(resp.json::<FloatingIpList>().await?.floatingips)
    }

    /// Fetch one floating IP by ID
    pub async fn show_floating_ip(
        &self,
        token: &str,
        floating_ip_id: &str,
    ) -> Result<FloatingIp, NeutronError> {
        let resp = self
            .client
            .get(self.url(&format!("/v2.0/floatingips/{}", floating_ip_id)))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        Ok(check(resp).await?.json::<FloatingIpEnvelope>().await?.floatingip)
    }

    /// List the port-forwarding rules on a floating IP
    pub async fn list_port_forwardings(
        &self,
        token: &str,
        floating_ip_id: &str,
    ) -> Result<Vec<PortForwarding>, NeutronError> {
        let resp = self
            .client
            .get(self.url(&format!(
                "/v2.0/floatingips/{}/port_forwardings",
                floating_ip_id
            )))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        Ok(check(resp)
            .await?
            .json::<PortForwardingList>()
            .await?
            .port_forwardings)
    }

    /// Create a port-forwarding rule
    ///
    /// A single atomic upstream call: on success exactly one rule exists,
    /// on any failure none does. Duplicate (floating IP, external port,
    /// protocol) tuples come back as `NeutronError::Conflict`.
    pub async fn create_port_forwarding(
        &self,
        token: &str,
        floating_ip_id: &str,
        internal_ip_address: &str,
        internal_port: u16,
        external_port: u16,
        protocol: Protocol,
    ) -> Result<PortForwarding, NeutronError> {
        let body = PortForwardingCreateEnvelope {
            port_forwarding: PortForwardingCreateBody {
                protocol,
                internal_ip_address,
                internal_port,
                external_port,
            },
        };
        let resp = self
            .client
            .post(self.url(&format!(
                "/v2.0/floatingips/{}/port_forwardings",
                floating_ip_id
            )))
            .header("X-Auth-Token", token)
            .json(&body)
            .send()
            .await?;
        Ok(check(resp)
            .await?
            .json::<PortForwardingEnvelope>()
            .await?
            .port_forwarding)
    }

    /// Delete a port-forwarding rule
    ///
    /// Not idempotent at this layer: deleting an absent rule returns
    /// `NeutronError::NotFound`, exactly as upstream reports it.
    pub async fn delete_port_forwarding(
        &self,
        token: &str,
        floating_ip_id: &str,
        pf_id: &str,
    ) -> Result<(), NeutronError> {
        let resp = self
            .client
            .delete(self.url(&format!(
                "/v2.0/floatingips/{}/port_forwardings/{}",
                floating_ip_id, pf_id
            )))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// List networks visible to the caller, optionally filtered by project
    pub async fn list_networks(
        &self,
        token: &str,
        tenant_id: Option<&str>,
    ) -> Result<Vec<Network>, NeutronError> {
        let mut req = self
            .client
            .get(self.url("/v2.0/networks"))
            .header("X-Auth-Token", token);
        if let Some(tenant) = tenant_id {
            req = req.query(&[("tenant_id", tenant)]);
        }
        let resp = check(req.send().await?).await?;
        Ok(resp.json::<NetworkList>().await?.networks)
    }

    /// Count-oriented listing of a project's ports
    pub async fn list_ports(
        &self,
        token: &str,
        tenant_id: &str,
    ) -> Result<Vec<ResourceRef>, NeutronError> {
        self.list_refs(token, "/v2.0/ports", "ports", tenant_id).await
    }

    /// Count-oriented listing of a project's routers
    pub async fn list_routers(
        &self,
        token: &str,
        tenant_id: &str,
    ) -> Result<Vec<ResourceRef>, NeutronError> {
        self.list_refs(token, "/v2.0/routers", "routers", tenant_id).await
    }

    /// Count-oriented listing of a project's subnets
    pub async fn list_subnets(
        &self,
        token: &str,
        tenant_id: &str,
    ) -> Result<Vec<ResourceRef>, NeutronError> {
        self.list_refs(token, "/v2.0/subnets", "subnets", tenant_id).await
    }

    /// Count-oriented listing of a project's security groups
    pub async fn list_security_groups(
        &self,
        token: &str,
        tenant_id: &str,
    ) -> Result<Vec<ResourceRef>, NeutronError> {
        self.list_refs(token, "/v2.0/security-groups", "security_groups", tenant_id)
            .await
    }

    /// Fetch the network quota set for a project
    pub async fn get_quotas(
        &self,
        token: &str,
        project_id: &str,
    ) -> Result<NeutronQuota, NeutronError> {
        let resp = self
            .client
            .get(self.url(&format!("/v2.0/quotas/{}", project_id)))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        Ok(check(resp).await?.json::<QuotaEnvelope>().await?.quota)
    }

    async fn list_refs(
        &self,
        token: &str,
        path: &str,
        key: &str,
        tenant_id: &str,
    ) -> Result<Vec<ResourceRef>, NeutronError> {
        let resp = self
            .client
            .get(self.url(path))
            .header("X-Auth-Token", token)
            .query(&[("tenant_id", tenant_id)])
            .send()
            .await?;
        let mut body: serde_json::Map<String, serde_json::Value> =
            check(resp).await?.json().await?;
        let items = body
            .remove(key)
            .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
        serde_json::from_value(items).map_err(|e| NeutronError::Api {
            status: 200,
            message: format!("malformed {} listing: {}", key, e),
        })
    }
}

/// Map an upstream error response onto the client error taxonomy.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, NeutronError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    match status.as_u16() {
        401 | 403 => Err(NeutronError::Auth(message)),
        404 => Err(NeutronError::NotFound(message)),
        409 => Err(NeutronError::Conflict(message)),
        s => Err(NeutronError::Api { status: s, message }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> NeutronClient {
        NeutronClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn lists_floating_ips_for_tenant() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2.0/floatingips"))
            .and(query_param("tenant_id", "proj-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "floatingips": [{
                    "id": "fip-1",
                    "floating_ip_address": "203.0.113.10",
                    "tenant_id": "proj-1",
                    "port_id": null,
                    "fixed_ip_address": null,
                    "status": "DOWN",
                }]
            })))
            .mount(&server)
            .await;

        let fips = client(&server)
            .list_floating_ips("tok", Some("proj-1"))
            .await
            .unwrap();
        assert_eq!(fips.len(), 1);
        assert_eq!(fips[0].floating_ip_address, "203.0.113.10");
        assert!(fips[0].port_id.is_none());
    }

    #[tokio::test]
    async fn create_conflict_maps_to_conflict_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2.0/floatingips/fip-1/port_forwardings"))
            .respond_with(ResponseTemplate::new(409).set_body_string(
                "A duplicate port forwarding entry with same attributes already exists",
            ))
            .mount(&server)
            .await;

        let err = client(&server)
            .create_port_forwarding("tok", "fip-1", "10.0.0.5", 80, 10080, Protocol::Tcp)
            .await
            .unwrap_err();
        assert!(matches!(err, NeutronError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_absent_rule_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2.0/floatingips/fip-1/port_forwardings/pf-9"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such rule"))
            .mount(&server)
            .await;

        let err = client(&server)
            .delete_port_forwarding("tok", "fip-1", "pf-9")
            .await
            .unwrap_err();
        assert!(matches!(err, NeutronError::NotFound(_)));
    }

    #[tokio::test]
    async fn expired_token_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2.0/floatingips/fip-1/port_forwardings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let err = client(&server)
            .list_port_forwardings("tok", "fip-1")
            .await
            .unwrap_err();
        assert!(matches!(err, NeutronError::Auth(_)));
    }

    #[tokio::test]
    async fn created_rule_round_trips() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2.0/floatingips/fip-1/port_forwardings"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "port_forwarding": {
                    "id": "pf-1",
                    "protocol": "tcp",
                    "internal_ip_address": "10.0.0.5",
                    "internal_port": 80,
                    "external_port": 10080,
                }
            })))
            .mount(&server)
            .await;

        let pf = client(&server)
            .create_port_forwarding("tok", "fip-1", "10.0.0.5", 80, 10080, Protocol::Tcp)
            .await
            .unwrap();
        assert_eq!(pf.id, "pf-1");
        assert_eq!(pf.external_port, 10080);
        assert_eq!(pf.protocol, Protocol::Tcp);
    }
}
