// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Shared test harness: boots the stub OpenStack deployment on an
//! ephemeral port and builds gateway components against it.

#![allow(dead_code)]

use openstack_stub_server::StubContext;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use stratus_gateway::config::Config;
use stratus_gateway::context::ApiContext;
use stratus_gateway::provision::Provisioner;
use stratus_api::ProvisioningInfo;
use uuid::Uuid;

/// Upstream token seeded into the stub for component-level tests
pub const TEST_TOKEN: &str = "test-token";

/// The seeded end-user project
pub const PROJECT: &str = "p-alice";

pub struct Harness {
    pub stub: Arc<StubContext>,
    pub base_url: String,
    _server: dropshot::HttpServer<Arc<StubContext>>,
}

impl Harness {
    /// Start the stub deployment on an ephemeral port
    pub async fn start() -> Self {
        let stub = Arc::new(StubContext::new());
        let api = openstack_stub_server::api_description().expect("stub api description");

        let config = dropshot::ConfigDropshot {
            bind_address: "127.0.0.1:0".parse().expect("bind address"),
            default_request_body_max_bytes: 1024 * 1024,
            default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
            ..Default::default()
        };
        let log = dropshot::ConfigLogging::StderrTerminal {
            level: dropshot::ConfigLoggingLevel::Warn,
        }
        .to_logger("openstack-stub-test")
        .expect("stub logger");

        let server = dropshot::HttpServerStarter::new(&config, api, Arc::clone(&stub), &log)
            .expect("stub server")
            .start();
        let base_url = format!("http://{}", server.local_addr());

        Self {
            stub,
            base_url,
            _server: server,
        }
    }

    /// Gateway configuration pointed at the stub, with fast poll timings
    pub fn config(&self) -> Config {
        Config {
            bind_address: "127.0.0.1:0".parse().expect("bind address"),
            keystone_url: format!("{}/identity", self.base_url),
            nova_url: format!("{}/compute", self.base_url),
            neutron_url: format!("{}/neutron", self.base_url),
            cinder_url: format!("{}/cinder", self.base_url),
            glance_url: format!("{}/image", self.base_url),
            session_secret: SecretString::from("integration-test-secret".to_string()),
            session_ttl_secs: 3600,
            default_region: "RegionOne".to_string(),
            default_domain: "Default".to_string(),
            http_timeout_secs: 5,
            port_forwarding_limit: 10,
            serialize_admission: true,
            ssh_floating_ip_id: None,
            shared_floating_ip_project_id: None,
            fixed_ip_poll_attempts: 5,
            fixed_ip_poll_interval: Duration::from_millis(10),
            system_username: Some("system".to_string()),
            system_password: Some(SecretString::from("system-password".to_string())),
            system_project: Some("service".to_string()),
            member_role_id: Some("role-member".to_string()),
            admin_role_id: Some("role-admin".to_string()),
            admin_user_id: Some("u-system".to_string()),
            nova_quota_instances: 10,
            nova_quota_cores: 4,
            nova_quota_ram: 6144,
            cinder_quota_gigabytes: 100,
        }
    }

    /// Build gateway components from a (possibly customized) config
    pub fn context(&self, config: Config) -> ApiContext {
        ApiContext::new(config).expect("gateway context")
    }
}

/// Poll a provisioning request until it reaches a terminal state
pub async fn wait_terminal(provisioner: &Provisioner, request_id: Uuid) -> ProvisioningInfo {
    for _ in 0..300 {
        if let Some(info) = provisioner.get(request_id).await {
            if info.status.is_terminal() {
                return info;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("provisioning request {} never reached a terminal state", request_id);
}
