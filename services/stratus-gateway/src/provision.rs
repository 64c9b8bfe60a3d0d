// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Provisioning orchestrator
//!
//! Runs the ordered sequence behind `POST /instances`: create the
//! instance, wait for its fixed address, set up SSH forwarding, then
//! expose the requested ports through admission control. Each accepted
//! request runs in its own background task; callers poll the request
//! registry for state.
//!
//! Failure policy is asymmetric on purpose: instance creation is
//! expensive and user-visible, so nothing in the networking stage ever
//! tears an instance down. SSH setup is best-effort (its failure is
//! recorded, not fatal), and per-port failures produce a partial-success
//! result instead of collapsing the request.

use crate::admission::AdmissionController;
use crate::errors::GatewayError;
use crate::pool::FloatingIpPool;
use crate::rules::RuleStore;
use neutron_client::Protocol;
use nova_client::NovaClient;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use stratus_api::{
    InstanceCreate, PortOutcome, PortOutcomeStatus, ProvisioningInfo, ProvisioningStatus,
    SshAccess,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Orchestrator plus the in-memory registry of provisioning requests
#[derive(Clone)]
pub struct Provisioner {
    nova: Arc<NovaClient>,
    pool: FloatingIpPool,
    rules: RuleStore,
    admission: AdmissionController,
    registry: Arc<RwLock<HashMap<Uuid, ProvisioningInfo>>>,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl Provisioner {
    pub fn new(
        nova: Arc<NovaClient>,
        pool: FloatingIpPool,
        rules: RuleStore,
        admission: AdmissionController,
        poll_attempts: u32,
        poll_interval: Duration,
    ) -> Self {
        Self {
            nova,
            pool,
            rules,
            admission,
            registry: Arc::new(RwLock::new(HashMap::new())),
            poll_attempts,
            poll_interval,
        }
    }

    /// Current state of a provisioning request
    pub async fn get(&self, request_id: Uuid) -> Option<ProvisioningInfo> {
        self.registry.read().await.get(&request_id).cloned()
    }

    /// Accept a provisioning request and start it in the background.
    ///
    /// The request ID doubles as an idempotency key: resubmitting a
    /// known ID returns the existing record's state — terminal or not —
    /// and never provisions again.
    pub async fn submit(
        &self,
        token: String,
        project_id: String,
        user_name: String,
        request: InstanceCreate,
    ) -> (Uuid, ProvisioningStatus) {
        let request_id = request.request_id.unwrap_or_else(Uuid::new_v4);
        {
            let mut registry = self.registry.write().await;
            if let Some(existing) = registry.get(&request_id) {
                return (request_id, existing.status);
            }
            registry.insert(
                request_id,
                ProvisioningInfo {
                    request_id,
                    status: ProvisioningStatus::Pending,
                    instance_id: None,
                    fixed_ip: None,
                    ssh: None,
                    ssh_error: None,
                    ports: Vec::new(),
                    error: None,
                },
            );
        }

        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator
                .run(request_id, token, project_id, user_name, request)
                .await;
        });
        (request_id, ProvisioningStatus::Pending)
    }

    async fn run(
        &self,
        request_id: Uuid,
        token: String,
        project_id: String,
        user_name: String,
        request: InstanceCreate,
    ) {
        match self
            .run_to_completion(request_id, &token, &project_id, &user_name, request)
            .await
        {
            Ok(()) => {
                crate::metrics::PROVISIONING_TOTAL
                    .with_label_values(&["complete"])
                    .inc();
            }
            Err(e) => {
                crate::metrics::PROVISIONING_TOTAL
                    .with_label_values(&["failed"])
                    .inc();
                tracing::warn!(%request_id, error = %e, "provisioning failed");
                let message = e.to_string();
                self.update(request_id, |info| {
                    info.status = ProvisioningStatus::Failed;
                    info.error = Some(message);
                })
                .await;
            }
        }
    }

    async fn run_to_completion(
        &self,
        request_id: Uuid,
        token: &str,
        project_id: &str,
        user_name: &str,
        request: InstanceCreate,
    ) -> Result<(), GatewayError> {
        self.update(request_id, |info| {
            info.status = ProvisioningStatus::InstanceCreating;
        })
        .await;

        let name = request
            .name
            .clone()
            .unwrap_or_else(|| format!("{}-vm", user_name));
        let server = self
            .nova
            .create_server(
                token,
                &name,
                &request.image_id,
                &request.flavor_id,
                &request.network_id,
                &request.key_name,
            )
            .await?;
        let server_id = server.id.clone();
        self.update(request_id, |info| {
            info.instance_id = Some(server_id.clone());
        })
        .await;

        let fixed_ip = self.wait_for_fixed_address(token, &server.id).await?;
        self.update(request_id, |info| {
            info.status = ProvisioningStatus::InstanceReady;
            info.fixed_ip = Some(fixed_ip.clone());
        })
        .await;

        self.update(request_id, |info| {
            info.status = ProvisioningStatus::Networking;
        })
        .await;

        // Best-effort SSH exposure. The instance stays up either way;
        // a failure here leaves it reachable only via other mechanisms.
        match self.setup_ssh(token, &fixed_ip).await {
            Ok(ssh) => {
                self.update(request_id, |info| info.ssh = Some(ssh)).await;
            }
            Err(e) => {
                tracing::warn!(%request_id, error = %e, "SSH rule setup failed");
                let message = e.to_string();
                self.update(request_id, |info| info.ssh_error = Some(message))
                    .await;
            }
        }

        let outcomes = self
            .expose_ports(token, project_id, &fixed_ip, &request.exposed_ports)
            .await;
        self.update(request_id, |info| {
            info.ports = outcomes;
            info.status = ProvisioningStatus::Complete;
        })
        .await;
        Ok(())
    }

    /// Bounded poll with fixed backoff for the instance's fixed address.
    /// Address assignment is asynchronous on the compute side; after the
    /// window closes the request fails and is not retried.
    async fn wait_for_fixed_address(
        &self,
        token: &str,
        server_id: &str,
    ) -> Result<String, GatewayError> {
        for _ in 0..self.poll_attempts {
            let server = self.nova.get_server(token, server_id).await?;
            if let Some(address) = server.fixed_address() {
                return Ok(address.to_string());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        Err(GatewayError::NetworkingTimeout)
    }

    async fn setup_ssh(&self, token: &str, fixed_ip: &str) -> Result<SshAccess, GatewayError> {
        let fip = self.pool.reserve_for_ssh(token).await?;
        let rule = self
            .rules
            .create_rule(token, &fip.id, fixed_ip, 22, None, Protocol::Tcp)
            .await?;
        Ok(SshAccess {
            floating_ip_address: fip.floating_ip_address,
            external_port: rule.external_port,
        })
    }

    /// Expose the requested ports in order. The first admission denial
    /// or port conflict stops the remaining ports (reported as skipped);
    /// other failures are recorded per port and processing continues.
    async fn expose_ports(
        &self,
        token: &str,
        project_id: &str,
        fixed_ip: &str,
        ports: &[u16],
    ) -> Vec<PortOutcome> {
        let mut outcomes = Vec::with_capacity(ports.len());
        let mut stopped = false;
        for &internal_port in ports {
            if stopped {
                outcomes.push(outcome(internal_port, PortOutcomeStatus::Skipped, None, None));
                continue;
            }
            match self.expose_one(token, project_id, fixed_ip, internal_port).await {
                Ok((address, external_port)) => {
                    let mut entry = outcome(
                        internal_port,
                        PortOutcomeStatus::Created,
                        None,
                        Some(address),
                    );
                    entry.external_port = Some(external_port);
                    outcomes.push(entry);
                }
                Err(e @ GatewayError::AdmissionDenied { .. }) => {
                    stopped = true;
                    outcomes.push(outcome(
                        internal_port,
                        PortOutcomeStatus::Denied,
                        Some(e.to_string()),
                        None,
                    ));
                }
                Err(e @ GatewayError::Conflict(_)) => {
                    stopped = true;
                    outcomes.push(outcome(
                        internal_port,
                        PortOutcomeStatus::Conflict,
                        Some(e.to_string()),
                        None,
                    ));
                }
                Err(e) => {
                    outcomes.push(outcome(
                        internal_port,
                        PortOutcomeStatus::Failed,
                        Some(e.to_string()),
                        None,
                    ));
                }
            }
        }
        outcomes
    }

    async fn expose_one(
        &self,
        token: &str,
        project_id: &str,
        fixed_ip: &str,
        internal_port: u16,
    ) -> Result<(String, u16), GatewayError> {
        let permit = self.admission.check_and_reserve(token, project_id).await?;
        let fip = self.pool.acquire_shared(token).await?;
        let rule = self
            .rules
            .create_rule(token, &fip.id, fixed_ip, internal_port, None, Protocol::Tcp)
            .await?;
        drop(permit);
        Ok((fip.floating_ip_address, rule.external_port))
    }

    /// Apply a mutation unless the record is already terminal. Terminal
    /// records are immutable; late task updates are dropped.
    async fn update<F>(&self, request_id: Uuid, mutate: F)
    where
        F: FnOnce(&mut ProvisioningInfo),
    {
        let mut registry = self.registry.write().await;
        if let Some(info) = registry.get_mut(&request_id) {
            if info.status.is_terminal() {
                tracing::debug!(%request_id, "ignoring update to terminal request");
                return;
            }
            mutate(info);
        }
    }
}

fn outcome(
    internal_port: u16,
    status: PortOutcomeStatus,
    message: Option<String>,
    floating_ip_address: Option<String>,
) -> PortOutcome {
    PortOutcome {
        internal_port,
        external_port: None,
        floating_ip_address,
        protocol: stratus_api::Protocol::Tcp,
        status,
        message,
    }
}
