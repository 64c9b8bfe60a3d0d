// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Stratus API implementation
//!
//! Handlers stay thin: resolve the session, delegate to the owning
//! component, translate the error taxonomy at the boundary.

use crate::context::ApiContext;
use crate::errors::GatewayError;
use crate::{limits, signup};
use dropshot::{
    Body, HttpError, HttpResponseAccepted, HttpResponseCreated, HttpResponseDeleted,
    HttpResponseOk, Path, RequestContext, TypedBody,
};
use http::Response;
use stratus_api::{
    ConsoleInfo, ConsoleRequest, ConsoleType, Flavor, FlavorListResponse, Image,
    ImageListResponse, InstanceCreate, InstancePath, Keypair, KeypairListResponse, LimitSummary,
    LoginRequest, LoginResponse, NetworkInfo, NetworkListResponse, PortForwardingCreate,
    PortForwardingDelete, PortForwardingInfo, ProvisioningAccepted, ProvisioningInfo,
    SessionProfile, SignupRequest, SignupResponse, StratusApi,
};
use stratus_auth_session::Profile;
use uuid::Uuid;

/// Stratus gateway API implementation
///
/// This enum serves as the implementation type for the `StratusApi`
/// trait. It contains no data - all state lives in the `ApiContext`.
pub enum StratusGatewayImpl {}

/// Resolve the session token from the Authorization header
fn authenticate(rqctx: &RequestContext<ApiContext>) -> Result<Profile, HttpError> {
    let ctx = rqctx.context();
    let header = rqctx
        .request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            GatewayError::Authentication("missing Authorization header".to_string()).into_http()
        })?;
    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        GatewayError::Authentication("expected a bearer token".to_string()).into_http()
    })?;
    ctx.sessions
        .verify(token)
        .map_err(|e| GatewayError::from(e).into_http())
}

fn wire_protocol(protocol: stratus_api::Protocol) -> neutron_client::Protocol {
    match protocol {
        stratus_api::Protocol::Tcp => neutron_client::Protocol::Tcp,
        stratus_api::Protocol::Udp => neutron_client::Protocol::Udp,
    }
}

fn api_protocol(protocol: neutron_client::Protocol) -> stratus_api::Protocol {
    match protocol {
        neutron_client::Protocol::Tcp => stratus_api::Protocol::Tcp,
        neutron_client::Protocol::Udp => stratus_api::Protocol::Udp,
    }
}

impl StratusApi for StratusGatewayImpl {
    type Context = ApiContext;

    async fn login(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<LoginRequest>,
    ) -> Result<HttpResponseOk<LoginResponse>, HttpError> {
        let ctx = rqctx.context();
        let request = body.into_inner();
        let domain = request
            .domain
            .unwrap_or_else(|| ctx.config.default_domain.clone());
        let region = request
            .region
            .unwrap_or_else(|| ctx.config.default_region.clone());

        // No explicit scope: with a default project set (signup always
        // sets one), the identity service scopes the token to it.
        let token_info = ctx
            .keystone
            .authenticate(&request.username, &request.password, &domain, None)
            .await
            .map_err(|e| GatewayError::from(e).into_http())?;
        let project = token_info.project.ok_or_else(|| {
            GatewayError::Authentication("account has no default project".to_string()).into_http()
        })?;

        let profile = Profile {
            user_id: token_info.user_id,
            user_name: token_info.user_name,
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            region,
            keystone_token: token_info.token,
        };
        let (token, expires_at) = ctx
            .sessions
            .issue(profile.clone(), token_info.expires_at)
            .map_err(|e| GatewayError::from(e).into_http())?;

        tracing::info!(user = %profile.user_name, project = %profile.project_id, "login");
        Ok(HttpResponseOk(LoginResponse {
            token,
            profile: SessionProfile {
                user_id: profile.user_id,
                user_name: profile.user_name,
                project_id: profile.project_id,
                project_name: profile.project_name,
                region: profile.region,
                expires_at,
            },
        }))
    }

    async fn signup(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<SignupRequest>,
    ) -> Result<HttpResponseCreated<SignupResponse>, HttpError> {
        let ctx = rqctx.context();
        let request = body.into_inner();
        let response = signup::provision_account(ctx, &request)
            .await
            .map_err(GatewayError::into_http)?;
        Ok(HttpResponseCreated(response))
    }

    async fn instance_create(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<InstanceCreate>,
    ) -> Result<HttpResponseAccepted<ProvisioningAccepted>, HttpError> {
        let ctx = rqctx.context();
        let profile = authenticate(&rqctx)?;
        let request = body.into_inner();
        let (request_id, status) = ctx
            .provisioner
            .submit(
                profile.keystone_token,
                profile.project_id,
                profile.user_name,
                request,
            )
            .await;
        Ok(HttpResponseAccepted(ProvisioningAccepted {
            request_id,
            status,
        }))
    }

    async fn instance_get(
        rqctx: RequestContext<Self::Context>,
        path: Path<InstancePath>,
    ) -> Result<HttpResponseOk<ProvisioningInfo>, HttpError> {
        let ctx = rqctx.context();
        let _profile = authenticate(&rqctx)?;
        let id = path.into_inner().id;
        let request_id = Uuid::parse_str(&id).map_err(|_| {
            HttpError::for_not_found(None, format!("no provisioning request {}", id))
        })?;
        let info = ctx.provisioner.get(request_id).await.ok_or_else(|| {
            HttpError::for_not_found(None, format!("no provisioning request {}", id))
        })?;
        Ok(HttpResponseOk(info))
    }

    async fn instance_console(
        rqctx: RequestContext<Self::Context>,
        path: Path<InstancePath>,
        body: TypedBody<ConsoleRequest>,
    ) -> Result<HttpResponseOk<ConsoleInfo>, HttpError> {
        let ctx = rqctx.context();
        let profile = authenticate(&rqctx)?;
        let server_id = path.into_inner().id;
        let (protocol, console_type) = match body.into_inner().console_type {
            ConsoleType::Novnc => ("vnc", "novnc"),
            ConsoleType::SpiceHtml5 => ("spice", "spice-html5"),
            ConsoleType::Serial => ("serial", "serial"),
        };
        let console = ctx
            .nova
            .create_remote_console(&profile.keystone_token, &server_id, protocol, console_type)
            .await
            .map_err(|e| GatewayError::from(e).into_http())?;
        Ok(HttpResponseOk(ConsoleInfo {
            console_type: console.console_type,
            url: console.url,
        }))
    }

    async fn port_forwarding_create(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<PortForwardingCreate>,
    ) -> Result<HttpResponseCreated<PortForwardingInfo>, HttpError> {
        let ctx = rqctx.context();
        let profile = authenticate(&rqctx)?;
        let request = body.into_inner();
        let token = profile.keystone_token.as_str();
        let protocol = wire_protocol(request.protocol.unwrap_or_default());

        let result: Result<(PortForwardingInfo, usize), GatewayError> = async {
            let permit = ctx
                .admission
                .check_and_reserve(token, &profile.project_id)
                .await?;
            let fip = ctx.pool.acquire_shared(token).await?;
            let rule = ctx
                .rules
                .create_rule(
                    token,
                    &fip.id,
                    &request.internal_ip,
                    request.internal_port,
                    request.external_port,
                    protocol,
                )
                .await?;
            let usage_before = permit.usage;
            drop(permit);
            Ok((PortForwardingInfo {
                id: rule.id,
                floating_ip_id: fip.id,
                floating_ip_address: fip.floating_ip_address.clone(),
                internal_ip_address: rule.internal_ip_address,
                internal_port: rule.internal_port,
                external_port: rule.external_port,
                protocol: api_protocol(rule.protocol),
                status: rule.status.unwrap_or_else(|| "ACTIVE".to_string()),
                assigned_port: rule.external_port,
                public_ip: fip.floating_ip_address,
            }, usage_before))
        }
        .await;

        let (info, usage_before) = result.map_err(GatewayError::into_http)?;
        tracing::info!(
            project = %profile.project_id,
            floating_ip = %info.floating_ip_id,
            external_port = info.external_port,
            usage = usage_before + 1,
            "created port forwarding"
        );
        Ok(HttpResponseCreated(info))
    }

    async fn port_forwarding_delete(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<PortForwardingDelete>,
    ) -> Result<HttpResponseDeleted, HttpError> {
        let ctx = rqctx.context();
        let profile = authenticate(&rqctx)?;
        let request = body.into_inner();
        ctx.rules
            .delete_rule(
                &profile.keystone_token,
                &request.floating_ip_id,
                &request.pf_id,
            )
            .await
            .map_err(GatewayError::into_http)?;
        Ok(HttpResponseDeleted())
    }

    async fn flavor_list(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<FlavorListResponse>, HttpError> {
        let ctx = rqctx.context();
        let profile = authenticate(&rqctx)?;
        let flavors = ctx
            .nova
            .list_flavors(&profile.keystone_token)
            .await
            .map_err(|e| GatewayError::from(e).into_http())?
            .into_iter()
            .map(|f| Flavor {
                id: f.id,
                name: f.name,
                vcpus: f.vcpus,
                ram: f.ram,
                disk: f.disk,
            })
            .collect();
        Ok(HttpResponseOk(FlavorListResponse { flavors }))
    }

    async fn image_list(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<ImageListResponse>, HttpError> {
        let ctx = rqctx.context();
        let profile = authenticate(&rqctx)?;
        let images = ctx
            .glance
            .list_images(&profile.keystone_token)
            .await
            .map_err(|e| GatewayError::from(e).into_http())?
            .into_iter()
            .map(|i| Image {
                id: i.id,
                name: i.name.unwrap_or_default(),
                status: i.status,
                min_disk: i.min_disk,
                min_ram: i.min_ram,
            })
            .collect();
        Ok(HttpResponseOk(ImageListResponse { images }))
    }

    async fn keypair_list(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<KeypairListResponse>, HttpError> {
        let ctx = rqctx.context();
        let profile = authenticate(&rqctx)?;
        let keypairs = ctx
            .nova
            .list_keypairs(&profile.keystone_token)
            .await
            .map_err(|e| GatewayError::from(e).into_http())?
            .into_iter()
            .map(|k| Keypair {
                name: k.name,
                fingerprint: k.fingerprint,
            })
            .collect();
        Ok(HttpResponseOk(KeypairListResponse { keypairs }))
    }

    async fn network_list(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<NetworkListResponse>, HttpError> {
        let ctx = rqctx.context();
        let profile = authenticate(&rqctx)?;
        let networks = ctx
            .neutron
            .list_networks(&profile.keystone_token, Some(&profile.project_id))
            .await
            .map_err(|e| GatewayError::from(e).into_http())?
            .into_iter()
            .map(|n| NetworkInfo {
                id: n.id,
                name: n.name,
                status: n.status,
                shared: n.shared,
                subnet_ids: n.subnets,
            })
            .collect();
        Ok(HttpResponseOk(NetworkListResponse { networks }))
    }

    async fn limits_get(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<LimitSummary>, HttpError> {
        let ctx = rqctx.context();
        let profile = authenticate(&rqctx)?;
        let summary = limits::limit_summary(ctx, &profile)
            .await
            .map_err(GatewayError::into_http)?;
        Ok(HttpResponseOk(summary))
    }

    async fn metrics_get(
        _rqctx: RequestContext<Self::Context>,
    ) -> Result<Response<Body>, HttpError> {
        let body = crate::metrics::gather();
        Response::builder()
            .status(http::StatusCode::OK)
            .header("Content-Type", "text/plain; version=0.0.4")
            .body(body.into())
            .map_err(|e| HttpError::for_internal_error(format!("metrics encoding: {}", e)))
    }
}
