// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Stratus Gateway Service
//!
//! Backend API gateway in front of an OpenStack deployment. It:
//!
//! - Authenticates end users against the identity service and wraps the
//!   issued token in an application session token
//! - Exposes simplified listing/creation endpoints for instances,
//!   flavors, images, keypairs, and networks
//! - Allocates port-forwarding rules from a shared floating-IP pool
//!   under a per-project cap
//! - Aggregates quota/usage data across the deployment

use anyhow::Result;
use dropshot::{ConfigDropshot, ConfigLogging, ConfigLoggingLevel, HttpServerStarter};
use tracing::info;

use stratus_gateway::config::Config;
use stratus_gateway::context::ApiContext;
use stratus_gateway::{StratusGatewayImpl, metrics};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "stratus_gateway=info,dropshot=info".to_string()),
        ))
        .init();

    let config = Config::from_env()?;
    let bind_address = config.bind_address;

    metrics::register().map_err(|e| anyhow::anyhow!("failed to register metrics: {}", e))?;

    info!("initializing upstream clients");
    let api_context = ApiContext::new(config)?;

    let api = stratus_api::stratus_api_mod::api_description::<StratusGatewayImpl>()
        .map_err(|e| anyhow::anyhow!("failed to create API description: {}", e))?;

    let config_dropshot = ConfigDropshot {
        bind_address,
        default_request_body_max_bytes: 1024 * 1024,
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
        ..Default::default()
    };

    let config_logging = ConfigLogging::StderrTerminal {
        level: ConfigLoggingLevel::Info,
    };

    let log = config_logging
        .to_logger("stratus-gateway")
        .map_err(|error| anyhow::anyhow!("failed to create logger: {}", error))?;

    let server = HttpServerStarter::new(&config_dropshot, api, api_context, &log)
        .map_err(|error| anyhow::anyhow!("failed to create server: {}", error))?
        .start();

    info!("stratus gateway running on http://{}", bind_address);

    server
        .await
        .map_err(|error| anyhow::anyhow!("server failed: {}", error))
}
