// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Instance provisioning types

use super::portforward::Protocol;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Path parameter carrying a provisioning-request or server ID
#[derive(Debug, Deserialize, JsonSchema)]
pub struct InstancePath {
    /// Request or server ID
    pub id: String,
}

/// Request to provision an instance with network exposure
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InstanceCreate {
    /// Instance name. Defaults to "<username>-vm" if omitted.
    #[serde(default)]
    pub name: Option<String>,
    /// Image to boot from
    pub image_id: String,
    /// Flavor sizing the instance
    pub flavor_id: String,
    /// SSH keypair name injected at boot
    pub key_name: String,
    /// Network to attach the primary NIC to
    pub network_id: String,
    /// Internal ports to expose through the shared floating-IP pool,
    /// in addition to the SSH rule the gateway always attempts.
    #[serde(default)]
    pub exposed_ports: Vec<u16>,
    /// Idempotency key. Resubmitting the same key returns the existing
    /// request instead of provisioning again.
    #[serde(default)]
    pub request_id: Option<Uuid>,
}

/// Provisioning request lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningStatus {
    /// Accepted, not yet started
    Pending,
    /// Instance creation submitted to the compute provider
    InstanceCreating,
    /// Instance exists and its fixed address is known
    InstanceReady,
    /// Port-forwarding rules are being set up
    Networking,
    /// Terminal: provisioning finished (possibly with per-port failures)
    Complete,
    /// Terminal: the instance could not be provisioned
    Failed,
}

impl ProvisioningStatus {
    /// Terminal states accept no further mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProvisioningStatus::Complete | ProvisioningStatus::Failed)
    }
}

/// Outcome of one requested port exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PortOutcomeStatus {
    /// Rule created
    Created,
    /// Rejected by admission control (per-project cap reached)
    Denied,
    /// Upstream rejected a duplicate external port
    Conflict,
    /// Creation failed for another reason (recorded in `message`)
    Failed,
    /// Not attempted because an earlier port failed
    Skipped,
}

/// Per-port result reported back to the caller
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PortOutcome {
    /// Internal port the caller asked to expose
    pub internal_port: u16,
    /// External port assigned, when created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_port: Option<u16>,
    /// Public address carrying the rule, when created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floating_ip_address: Option<String>,
    /// Protocol
    pub protocol: Protocol,
    /// What happened to this port
    pub status: PortOutcomeStatus,
    /// Failure detail, when not created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// SSH reachability details for a provisioned instance
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SshAccess {
    /// Public address of the SSH floating IP
    pub floating_ip_address: String,
    /// External port forwarded to the instance's port 22
    pub external_port: u16,
}

/// Response to an accepted provisioning request
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProvisioningAccepted {
    /// Request ID to poll
    pub request_id: Uuid,
    /// Initial state
    pub status: ProvisioningStatus,
}

/// Full provisioning request state
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProvisioningInfo {
    /// Request ID
    pub request_id: Uuid,
    /// Current state
    pub status: ProvisioningStatus,
    /// Compute instance ID, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    /// Fixed address of the instance, once published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_ip: Option<String>,
    /// SSH access, when the best-effort SSH rule succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshAccess>,
    /// Why SSH setup failed, when it did (the instance is still up)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_error: Option<String>,
    /// Per-port outcomes for the requested exposures
    pub ports: Vec<PortOutcome>,
    /// Terminal failure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Remote console type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub enum ConsoleType {
    #[serde(rename = "novnc")]
    Novnc,
    #[serde(rename = "spice-html5")]
    SpiceHtml5,
    #[serde(rename = "serial")]
    Serial,
}

/// Request for a remote console URL
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConsoleRequest {
    /// Console flavor to open
    pub console_type: ConsoleType,
}

/// Remote console access details
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ConsoleInfo {
    /// Console type granted
    #[serde(rename = "type")]
    pub console_type: String,
    /// One-time console URL
    pub url: String,
}
