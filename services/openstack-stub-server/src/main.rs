// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Standalone stub OpenStack deployment for local development

use anyhow::Result;
use dropshot::{ConfigDropshot, ConfigLogging, ConfigLoggingLevel, HttpServerStarter};
use openstack_stub_server::StubContext;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "openstack_stub_server=info,dropshot=info".to_string()),
        ))
        .init();

    let context = Arc::new(StubContext::new());
    // A couple of shared-pool addresses so port-forwarding flows work
    // out of the box.
    context.add_floating_ip("fip-ssh", "203.0.113.2", "p-shared");
    context.add_floating_ip("fip-a", "203.0.113.10", "p-shared");
    context.add_floating_ip("fip-b", "203.0.113.11", "p-shared");

    let api = openstack_stub_server::api_description()?;

    let bind_address = std::env::var("BIND_ADDRESS")
        .unwrap_or_else(|_| "127.0.0.1:9900".to_string())
        .parse()?;

    let config_dropshot = ConfigDropshot {
        bind_address,
        default_request_body_max_bytes: 1024 * 1024,
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
        ..Default::default()
    };

    let log = ConfigLogging::StderrTerminal {
        level: ConfigLoggingLevel::Info,
    }
    .to_logger("openstack-stub-server")
    .map_err(|error| anyhow::anyhow!("failed to create logger: {}", error))?;

    let server = HttpServerStarter::new(&config_dropshot, api, context, &log)
        .map_err(|error| anyhow::anyhow!("failed to create server: {}", error))?
        .start();

    info!("stub OpenStack deployment running on http://{}", bind_address);

    server
        .await
        .map_err(|error| anyhow::anyhow!("server failed: {}", error))
}
