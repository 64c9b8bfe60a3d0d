// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Gateway configuration
//!
//! All recognized settings, parsed once from the environment at startup
//! and passed into components at construction. Nothing reads settings
//! through global state, so tests can build a `Config` by hand and run
//! several differently configured gateways in one process.

use anyhow::{Context, Result};
use secrecy::SecretString;
use std::net::SocketAddr;
use std::time::Duration;

/// Default bind address for the HTTP server
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:9110";

/// Default per-project cap on port-forwarding rules
const DEFAULT_PORT_FORWARDING_LIMIT: u32 = 10;

/// Default session lifetime (seconds)
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Default upstream HTTP timeout (seconds)
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Default bounded-poll parameters for instance address readiness
const DEFAULT_FIXED_IP_POLL_ATTEMPTS: u32 = 30;
const DEFAULT_FIXED_IP_POLL_INTERVAL_SECS: u64 = 2;

/// Default quotas granted to freshly provisioned projects
const DEFAULT_NOVA_QUOTA_INSTANCES: i64 = 10;
const DEFAULT_NOVA_QUOTA_CORES: i64 = 4;
const DEFAULT_NOVA_QUOTA_RAM: i64 = 6144;
const DEFAULT_CINDER_QUOTA_GIGABYTES: i64 = 100;

/// Gateway configuration
#[derive(Clone)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: SocketAddr,

    /// Upstream service endpoints
    pub keystone_url: String,
    pub nova_url: String,
    pub neutron_url: String,
    pub cinder_url: String,
    pub glance_url: String,

    /// Secret signing the application session tokens
    pub session_secret: SecretString,
    /// Session lifetime; sessions also never outlive the wrapped
    /// provider token
    pub session_ttl_secs: u64,

    /// Region sessions default to when the login request names none
    pub default_region: String,
    /// Identity domain used for login and signup
    pub default_domain: String,

    /// Timeout applied to every upstream HTTP call
    pub http_timeout_secs: u64,

    /// Per-project cap on port-forwarding rules
    pub port_forwarding_limit: u32,
    /// Hold a per-project lock across the admission check and rule
    /// creation. Off restores the historic optimistic behavior: under
    /// concurrent requests the cap can be exceeded by up to one rule
    /// per extra in-flight request.
    pub serialize_admission: bool,

    /// The floating IP designated for SSH forwarding. Unset makes SSH
    /// setup fail with a configuration error rather than silently
    /// picking an address.
    pub ssh_floating_ip_id: Option<String>,
    /// Project owning the shared floating-IP pool. Unset disables
    /// shared-pool acquisition the same way.
    pub shared_floating_ip_project_id: Option<String>,

    /// Bounded poll for the instance's fixed address
    pub fixed_ip_poll_attempts: u32,
    pub fixed_ip_poll_interval: Duration,

    /// Operations account used for signup provisioning
    pub system_username: Option<String>,
    pub system_password: Option<SecretString>,
    pub system_project: Option<String>,

    /// Role/user wiring applied to freshly provisioned projects
    pub member_role_id: Option<String>,
    pub admin_role_id: Option<String>,
    pub admin_user_id: Option<String>,

    /// Quotas granted to freshly provisioned projects
    pub nova_quota_instances: i64,
    pub nova_quota_cores: i64,
    pub nova_quota_ram: i64,
    pub cinder_quota_gigabytes: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let bind_address = std::env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string())
            .parse()
            .context("Invalid BIND_ADDRESS")?;

        let keystone_url =
            std::env::var("KEYSTONE_URL").context("KEYSTONE_URL environment variable required")?;
        let nova_url =
            std::env::var("NOVA_URL").context("NOVA_URL environment variable required")?;
        let neutron_url =
            std::env::var("NEUTRON_URL").context("NEUTRON_URL environment variable required")?;
        let cinder_url =
            std::env::var("CINDER_URL").context("CINDER_URL environment variable required")?;
        let glance_url =
            std::env::var("GLANCE_URL").context("GLANCE_URL environment variable required")?;

        let session_secret = SecretString::from(
            std::env::var("SESSION_SECRET")
                .context("SESSION_SECRET environment variable required")?,
        );

        let session_ttl_secs = parse_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        let http_timeout_secs = parse_env("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        let port_forwarding_limit =
            parse_env("PORT_FORWARDING_LIMIT", DEFAULT_PORT_FORWARDING_LIMIT)?;
        let fixed_ip_poll_attempts =
            parse_env("FIXED_IP_POLL_ATTEMPTS", DEFAULT_FIXED_IP_POLL_ATTEMPTS)?;
        let fixed_ip_poll_interval_secs = parse_env(
            "FIXED_IP_POLL_INTERVAL_SECS",
            DEFAULT_FIXED_IP_POLL_INTERVAL_SECS,
        )?;

        // Accepts "true", "1", "yes" (case-insensitive) as true.
        let serialize_admission = std::env::var("SERIALIZE_ADMISSION")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(true);

        Ok(Self {
            bind_address,
            keystone_url,
            nova_url,
            neutron_url,
            cinder_url,
            glance_url,
            session_secret,
            session_ttl_secs,
            default_region: std::env::var("DEFAULT_REGION")
                .unwrap_or_else(|_| "RegionOne".to_string()),
            default_domain: std::env::var("DEFAULT_DOMAIN")
                .unwrap_or_else(|_| "Default".to_string()),
            http_timeout_secs,
            port_forwarding_limit,
            serialize_admission,
            ssh_floating_ip_id: optional_env("SSH_FLOATING_IP_ID"),
            shared_floating_ip_project_id: optional_env("SHARED_FLOATING_IP_PROJECT_ID"),
            fixed_ip_poll_attempts,
            fixed_ip_poll_interval: Duration::from_secs(fixed_ip_poll_interval_secs),
            system_username: optional_env("SYSTEM_USERNAME"),
            system_password: optional_env("SYSTEM_PASSWORD").map(SecretString::from),
            system_project: optional_env("SYSTEM_PROJECT"),
            member_role_id: optional_env("MEMBER_ROLE_ID"),
            admin_role_id: optional_env("ADMIN_ROLE_ID"),
            admin_user_id: optional_env("ADMIN_USER_ID"),
            nova_quota_instances: parse_env("NOVA_QUOTA_INSTANCES", DEFAULT_NOVA_QUOTA_INSTANCES)?,
            nova_quota_cores: parse_env("NOVA_QUOTA_CORES", DEFAULT_NOVA_QUOTA_CORES)?,
            nova_quota_ram: parse_env("NOVA_QUOTA_RAM", DEFAULT_NOVA_QUOTA_RAM)?,
            cinder_quota_gigabytes: parse_env(
                "CINDER_QUOTA_GIGABYTES",
                DEFAULT_CINDER_QUOTA_GIGABYTES,
            )?,
        })
    }

    /// Timeout applied to every upstream HTTP call
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(v) => v.parse().with_context(|| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}
