// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Port-forwarding types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Transport protocol for a NAT rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP (default)
    #[default]
    Tcp,
    /// UDP
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

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to create a port-forwarding rule
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PortForwardingCreate {
    /// Internal (fixed) address the rule forwards to
    pub internal_ip: String,
    /// Internal port
    pub internal_port: u16,
    /// External port. When omitted, the gateway picks a free one.
    #[serde(default)]
    pub external_port: Option<u16>,
    /// Protocol. Defaults to tcp.
    #[serde(default)]
    pub protocol: Option<Protocol>,
}

/// A provisioned port-forwarding rule
///
/// `assigned_port` and `public_ip` repeat `external_port` and
/// `floating_ip_address`; older consumers read the short names.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PortForwardingInfo {
    /// Rule ID (needed for deletion)
    pub id: String,
    /// ID of the floating IP carrying the rule
    pub floating_ip_id: String,
    /// Public address of the floating IP
    pub floating_ip_address: String,
    /// Internal address
    pub internal_ip_address: String,
    /// Internal port
    pub internal_port: u16,
    /// External port
    pub external_port: u16,
    /// Protocol
    pub protocol: Protocol,
    /// Rule status as reported upstream
    pub status: String,
    /// External port (legacy alias)
    pub assigned_port: u16,
    /// Public address (legacy alias)
    pub public_ip: String,
}

/// Request to delete a port-forwarding rule
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PortForwardingDelete {
    /// ID of the floating IP carrying the rule
    pub floating_ip_id: String,
    /// Rule ID
    pub pf_id: String,
}
