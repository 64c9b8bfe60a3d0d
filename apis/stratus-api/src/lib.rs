// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Stratus gateway API definition
//!
//! The simplified REST surface the gateway exposes in front of the
//! OpenStack deployment. All endpoints except `/login`, `/signup`, and
//! `/metrics` require a session token in the `Authorization: Bearer`
//! header.

use dropshot::{
    Body, HttpError, HttpResponseAccepted, HttpResponseCreated, HttpResponseDeleted,
    HttpResponseOk, Path, RequestContext, TypedBody,
};
use http::Response;

mod types;

pub use types::*;

/// Stratus gateway API trait
#[dropshot::api_description]
pub trait StratusApi {
    /// Context type for request handlers
    type Context: Send + Sync + 'static;

    // ========================================================================
    // Sessions and accounts
    // ========================================================================

    /// Authenticate with the identity provider and open a session
    #[endpoint {
        method = POST,
        path = "/login",
        tags = ["auth"],
    }]
    async fn login(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<LoginRequest>,
    ) -> Result<HttpResponseOk<LoginResponse>, HttpError>;

    /// Create an account with a dedicated project and default quotas
    #[endpoint {
        method = POST,
        path = "/signup",
        tags = ["auth"],
    }]
    async fn signup(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<SignupRequest>,
    ) -> Result<HttpResponseCreated<SignupResponse>, HttpError>;

    // ========================================================================
    // Instances
    // ========================================================================

    /// Provision an instance with network exposure
    ///
    /// Provisioning proceeds asynchronously; poll `GET /instances/{id}`
    /// with the returned request ID for the final state.
    #[endpoint {
        method = POST,
        path = "/instances",
        tags = ["instances"],
    }]
    async fn instance_create(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<InstanceCreate>,
    ) -> Result<HttpResponseAccepted<ProvisioningAccepted>, HttpError>;

    /// Get the state of a provisioning request
    #[endpoint {
        method = GET,
        path = "/instances/{id}",
        tags = ["instances"],
    }]
    async fn instance_get(
        rqctx: RequestContext<Self::Context>,
        path: Path<InstancePath>,
    ) -> Result<HttpResponseOk<ProvisioningInfo>, HttpError>;

    /// Open a remote console to an instance
    ///
    /// `{id}` here is the compute provider's server ID, not a
    /// provisioning-request ID.
    #[endpoint {
        method = POST,
        path = "/instances/{id}/console",
        tags = ["instances"],
    }]
    async fn instance_console(
        rqctx: RequestContext<Self::Context>,
        path: Path<InstancePath>,
        body: TypedBody<ConsoleRequest>,
    ) -> Result<HttpResponseOk<ConsoleInfo>, HttpError>;

    // ========================================================================
    // Port forwarding
    // ========================================================================

    /// Create a port-forwarding rule on a shared floating IP
    ///
    /// Subject to the per-project port-forwarding cap; denied requests
    /// get a 400 and must free capacity first.
    #[endpoint {
        method = POST,
        path = "/port_forwardings",
        tags = ["network"],
    }]
    async fn port_forwarding_create(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<PortForwardingCreate>,
    ) -> Result<HttpResponseCreated<PortForwardingInfo>, HttpError>;

    /// Delete a port-forwarding rule
    ///
    /// Idempotent: deleting an already-absent rule succeeds.
    #[endpoint {
        method = DELETE,
        path = "/port_forwardings",
        tags = ["network"],
    }]
    async fn port_forwarding_delete(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<PortForwardingDelete>,
    ) -> Result<HttpResponseDeleted, HttpError>;

    // ========================================================================
    // Listings
    // ========================================================================

    /// List compute flavors
    #[endpoint {
        method = GET,
        path = "/flavors",
        tags = ["catalog"],
    }]
    async fn flavor_list(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<FlavorListResponse>, HttpError>;

    /// List bootable images
    #[endpoint {
        method = GET,
        path = "/images",
        tags = ["catalog"],
    }]
    async fn image_list(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<ImageListResponse>, HttpError>;

    /// List the caller's SSH keypairs
    #[endpoint {
        method = GET,
        path = "/keypairs",
        tags = ["catalog"],
    }]
    async fn keypair_list(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<KeypairListResponse>, HttpError>;

    /// List networks visible to the project
    #[endpoint {
        method = GET,
        path = "/networks",
        tags = ["catalog"],
    }]
    async fn network_list(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<NetworkListResponse>, HttpError>;

    // ========================================================================
    // Quotas and observability
    // ========================================================================

    /// Aggregated quota/usage report for the caller's project
    #[endpoint {
        method = GET,
        path = "/limits",
        tags = ["quotas"],
    }]
    async fn limits_get(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<LimitSummary>, HttpError>;

    /// Prometheus metrics in text exposition format
    #[endpoint {
        method = GET,
        path = "/metrics",
        tags = ["observability"],
    }]
    async fn metrics_get(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<Response<Body>, HttpError>;
}
