// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Port-forwarding rule store
//!
//! Owns the rule lifecycle against the network provider. Listings are
//! always a fresh upstream read; the derived per-project usage count is
//! recomputed from scratch on every call and never cached, so admission
//! control sees current state.

use crate::errors::GatewayError;
use neutron_client::{NeutronClient, PortForwarding, Protocol};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// External ports handed out when the caller does not pick one
const EXTERNAL_PORT_RANGE: RangeInclusive<u16> = 10000..=29999;

/// Store for NAT rules on the deployment's floating IPs
#[derive(Clone)]
pub struct RuleStore {
    neutron: Arc<NeutronClient>,
}

impl RuleStore {
    pub fn new(neutron: Arc<NeutronClient>) -> Self {
        Self { neutron }
    }

    /// Current rules on a floating IP, straight from upstream
    pub async fn list_rules(
        &self,
        token: &str,
        floating_ip_id: &str,
    ) -> Result<Vec<PortForwarding>, GatewayError> {
        Ok(self.neutron.list_port_forwardings(token, floating_ip_id).await?)
    }

    /// Create a rule.
    ///
    /// One atomic upstream call: on success exactly one rule exists, on
    /// any failure none does. When `external_port` is omitted the store
    /// picks the lowest free port in the configured range from a fresh
    /// listing; a concurrent claim of the same port loses with
    /// `Conflict`, which callers surface rather than retry silently.
    pub async fn create_rule(
        &self,
        token: &str,
        floating_ip_id: &str,
        internal_ip: &str,
        internal_port: u16,
        external_port: Option<u16>,
        protocol: Protocol,
    ) -> Result<PortForwarding, GatewayError> {
        let external_port = match external_port {
            Some(port) => port,
            None => self.pick_external_port(token, floating_ip_id, protocol).await?,
        };
        let rule = self
            .neutron
            .create_port_forwarding(
                token,
                floating_ip_id,
                internal_ip,
                internal_port,
                external_port,
                protocol,
            )
            .await?;
        crate::metrics::RULES_CREATED.inc();
        Ok(rule)
    }

    /// Delete a rule. Idempotent: rollback paths race with user-initiated
    /// deletes, so an already-absent rule is success, not an error.
    pub async fn delete_rule(
        &self,
        token: &str,
        floating_ip_id: &str,
        rule_id: &str,
    ) -> Result<(), GatewayError> {
        match self
            .neutron
            .delete_port_forwarding(token, floating_ip_id, rule_id)
            .await
        {
            Ok(()) => {
                crate::metrics::RULES_DELETED.inc();
                Ok(())
            }
            Err(neutron_client::NeutronError::NotFound(_)) => {
                tracing::debug!(rule_id, floating_ip_id, "rule already absent on delete");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rules attributable to a project: enumerate its floating IPs, list
    /// rules on each, sum. Always freshly computed.
    pub async fn project_usage(
        &self,
        token: &str,
        project_id: &str,
    ) -> Result<usize, GatewayError> {
        let fips = self
            .neutron
            .list_floating_ips(token, Some(project_id))
            .await?;
        let mut total = 0;
        for fip in &fips {
            total += self.list_rules(token, &fip.id).await?.len();
        }
        Ok(total)
    }

    async fn pick_external_port(
        &self,
        token: &str,
        floating_ip_id: &str,
        protocol: Protocol,
    ) -> Result<u16, GatewayError> {
        let used: HashSet<u16> = self
            .list_rules(token, floating_ip_id)
            .await?
            .into_iter()
            .filter(|rule| rule.protocol == protocol)
            .map(|rule| rule.external_port)
            .collect();
        EXTERNAL_PORT_RANGE
            .clone()
            .find(|port| !used.contains(port))
            .ok_or(GatewayError::ResourceExhausted)
    }
}
