// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Prometheus metrics for the gateway
//!
//! Exports counters for the scarce-resource paths worth watching:
//! - Port-forwarding rules created/deleted
//! - Admission denials (cap reached)
//! - Provisioning outcomes

use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};

// Static metric initialization uses expect because these are compile-time
// constant definitions that cannot fail in practice. If they do fail, it
// indicates a programming error (e.g., invalid metric name) that should
// cause a panic at startup.
//
// This module exists to scope the clippy allow attributes to just the
// metric definitions.
#[allow(clippy::expect_used)]
mod metrics_impl {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        /// Registry for all gateway metrics
        pub static ref REGISTRY: Registry = Registry::new();

        /// Port-forwarding rules created through the gateway
        pub static ref RULES_CREATED: Counter = Counter::with_opts(
            Opts::new("stratus_gateway_port_forwardings_created_total",
                "Port-forwarding rules created")
        ).expect("valid metric name");

        /// Port-forwarding rules deleted through the gateway
        pub static ref RULES_DELETED: Counter = Counter::with_opts(
            Opts::new("stratus_gateway_port_forwardings_deleted_total",
                "Port-forwarding rules deleted")
        ).expect("valid metric name");

        /// Requests rejected by admission control
        pub static ref ADMISSION_DENIED: Counter = Counter::with_opts(
            Opts::new("stratus_gateway_admission_denied_total",
                "Port-forwarding requests denied at the per-project cap")
        ).expect("valid metric name");

        /// Provisioning requests by terminal outcome (complete, failed)
        pub static ref PROVISIONING_TOTAL: CounterVec = CounterVec::new(
            Opts::new("stratus_gateway_provisioning_total",
                "Provisioning requests by terminal outcome"),
            &["outcome"]
        ).expect("valid metric name and labels");
    }
}

pub use metrics_impl::{
    ADMISSION_DENIED, PROVISIONING_TOTAL, REGISTRY, RULES_CREATED, RULES_DELETED,
};

/// Register all metrics with the registry. Call once at startup; errors
/// here mean a metric was defined twice.
pub fn register() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(RULES_CREATED.clone()))?;
    REGISTRY.register(Box::new(RULES_DELETED.clone()))?;
    REGISTRY.register(Box::new(ADMISSION_DENIED.clone()))?;
    REGISTRY.register(Box::new(PROVISIONING_TOTAL.clone()))?;
    Ok(())
}

/// Encode all registered metrics in text exposition format
pub fn gather() -> String {
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
