// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Floating-IP pool registry
//!
//! Owns the binding decisions over the deployment's floating IPs: which
//! address is designated for SSH forwarding and which shared-pool
//! address to hand to the next port-forwarding request. Addresses are
//! only ever observed and claimed here, never created; the network
//! provider owns their lifecycle.

use crate::errors::GatewayError;
use neutron_client::{FloatingIp, NeutronClient};
use std::sync::Arc;

/// Registry over the configured SSH address and shared pool
#[derive(Clone)]
pub struct FloatingIpPool {
    neutron: Arc<NeutronClient>,
    ssh_floating_ip_id: Option<String>,
    shared_project_id: Option<String>,
}

impl FloatingIpPool {
    pub fn new(
        neutron: Arc<NeutronClient>,
        ssh_floating_ip_id: Option<String>,
        shared_project_id: Option<String>,
    ) -> Self {
        Self {
            neutron,
            ssh_floating_ip_id,
            shared_project_id,
        }
    }

    /// The single designated SSH floating IP.
    ///
    /// Configuration-specified, not chosen dynamically; an unset
    /// `SSH_FLOATING_IP_ID` is a configuration error, not a reason to
    /// pick some other address.
    pub async fn reserve_for_ssh(&self, token: &str) -> Result<FloatingIp, GatewayError> {
        let id = self.ssh_floating_ip_id.as_deref().ok_or_else(|| {
            GatewayError::Configuration("SSH_FLOATING_IP_ID is not configured".to_string())
        })?;
        Ok(self.neutron.show_floating_ip(token, id).await?)
    }

    /// One currently unattached floating IP from the shared pool.
    ///
    /// Optimistic: two concurrent callers can be handed the same
    /// address. That race is deliberate; the upstream uniqueness
    /// constraint on (floating IP, external port, protocol) is the
    /// authority, and the rule store surfaces the loser's conflict.
    pub async fn acquire_shared(&self, token: &str) -> Result<FloatingIp, GatewayError> {
        let project = self.shared_project_id.as_deref().ok_or_else(|| {
            GatewayError::Configuration(
                "SHARED_FLOATING_IP_PROJECT_ID is not configured".to_string(),
            )
        })?;
        let fips = self.neutron.list_floating_ips(token, Some(project)).await?;
        fips.into_iter()
            .filter(|fip| fip.port_id.is_none())
            .find(|fip| Some(fip.id.as_str()) != self.ssh_floating_ip_id.as_deref())
            .ok_or(GatewayError::ResourceExhausted)
    }
}
