// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! API context for the gateway

use crate::admission::AdmissionController;
use crate::config::Config;
use crate::pool::FloatingIpPool;
use crate::provision::Provisioner;
use crate::rules::RuleStore;
use anyhow::{Context, Result};
use chrono::Duration;
use cinder_client::CinderClient;
use glance_client::GlanceClient;
use keystone_client::KeystoneClient;
use neutron_client::NeutronClient;
use nova_client::NovaClient;
use std::sync::Arc;
use stratus_auth_session::SessionManager;

/// Context shared across all request handlers
pub struct ApiContext {
    pub config: Config,
    pub sessions: SessionManager,
    pub keystone: Arc<KeystoneClient>,
    pub nova: Arc<NovaClient>,
    pub neutron: Arc<NeutronClient>,
    pub cinder: Arc<CinderClient>,
    pub glance: Arc<GlanceClient>,
    pub pool: FloatingIpPool,
    pub rules: RuleStore,
    pub admission: AdmissionController,
    pub provisioner: Provisioner,
}

impl ApiContext {
    /// Wire up clients and components from a configuration value
    pub fn new(config: Config) -> Result<Self> {
        let timeout = config.http_timeout();

        let keystone = Arc::new(
            KeystoneClient::new(&config.keystone_url, timeout)
                .context("failed to build identity client")?,
        );
        let nova = Arc::new(
            NovaClient::new(&config.nova_url, timeout)
                .context("failed to build compute client")?,
        );
        let neutron = Arc::new(
            NeutronClient::new(&config.neutron_url, timeout)
                .context("failed to build network client")?,
        );
        let cinder = Arc::new(
            CinderClient::new(&config.cinder_url, timeout)
                .context("failed to build volume client")?,
        );
        let glance = Arc::new(
            GlanceClient::new(&config.glance_url, timeout)
                .context("failed to build image client")?,
        );

        let sessions = SessionManager::new(
            &config.session_secret,
            Duration::seconds(config.session_ttl_secs as i64),
        );

        let rules = RuleStore::new(Arc::clone(&neutron));
        let pool = FloatingIpPool::new(
            Arc::clone(&neutron),
            config.ssh_floating_ip_id.clone(),
            config.shared_floating_ip_project_id.clone(),
        );
        let admission = AdmissionController::new(
            rules.clone(),
            config.port_forwarding_limit,
            config.serialize_admission,
        );
        let provisioner = Provisioner::new(
            Arc::clone(&nova),
            pool.clone(),
            rules.clone(),
            admission.clone(),
            config.fixed_ip_poll_attempts,
            config.fixed_ip_poll_interval,
        );

        Ok(Self {
            config,
            sessions,
            keystone,
            nova,
            neutron,
            cinder,
            glance,
            pool,
            rules,
            admission,
            provisioner,
        })
    }
}
