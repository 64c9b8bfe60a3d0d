// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Account provisioning
//!
//! Signup runs an ordered sequence against the identity, compute, and
//! volume services: project, user, member role, admin role, default
//! quotas. Every completed step registers a compensation; when a later
//! step fails, compensations run in reverse order so no half-provisioned
//! account is left behind. A compensation that itself fails is logged
//! loudly and left for manual cleanup, never swallowed.

use crate::context::ApiContext;
use crate::errors::GatewayError;
use keystone_client::KeystoneClient;
use nova_client::QuotaUpdate;
use secrecy::ExposeSecret;
use stratus_api::{SignupRequest, SignupResponse};

/// Undo operation for one completed provisioning step
enum Compensation {
    DeleteProject(String),
    DeleteUser(String),
}

async fn compensate(keystone: &KeystoneClient, token: &str, undo: Vec<Compensation>) {
    for step in undo.into_iter().rev() {
        let result = match &step {
            Compensation::DeleteProject(id) => keystone.delete_project(token, id).await,
            Compensation::DeleteUser(id) => keystone.delete_user(token, id).await,
        };
        if let Err(e) = result {
            let what = match &step {
                Compensation::DeleteProject(id) => format!("project {}", id),
                Compensation::DeleteUser(id) => format!("user {}", id),
            };
            tracing::error!(error = %e, "signup compensation failed; {} needs manual cleanup", what);
        }
    }
}

/// Provision a new account: project, user, roles, default quotas.
pub async fn provision_account(
    ctx: &ApiContext,
    request: &SignupRequest,
) -> Result<SignupResponse, GatewayError> {
    let config = &ctx.config;
    let system_username = config.system_username.as_deref().ok_or_else(|| {
        GatewayError::Configuration("SYSTEM_USERNAME is not configured".to_string())
    })?;
    let system_password = config.system_password.as_ref().ok_or_else(|| {
        GatewayError::Configuration("SYSTEM_PASSWORD is not configured".to_string())
    })?;
    let system_project = config.system_project.as_deref().ok_or_else(|| {
        GatewayError::Configuration("SYSTEM_PROJECT is not configured".to_string())
    })?;
    let member_role_id = config.member_role_id.as_deref().ok_or_else(|| {
        GatewayError::Configuration("MEMBER_ROLE_ID is not configured".to_string())
    })?;
    let admin_role_id = config.admin_role_id.as_deref().ok_or_else(|| {
        GatewayError::Configuration("ADMIN_ROLE_ID is not configured".to_string())
    })?;
    let admin_user_id = config.admin_user_id.as_deref().ok_or_else(|| {
        GatewayError::Configuration("ADMIN_USER_ID is not configured".to_string())
    })?;

    let admin = ctx
        .keystone
        .authenticate(
            system_username,
            system_password.expose_secret(),
            &config.default_domain,
            Some(system_project),
        )
        .await?;
    let token = admin.token.as_str();

    let mut undo: Vec<Compensation> = Vec::new();

    let project = ctx
        .keystone
        .create_project(
            token,
            &format!("{}-project", request.username),
            &format!("Project for {}", request.username),
            "default",
        )
        .await?;
    undo.push(Compensation::DeleteProject(project.id.clone()));

    let user = match ctx
        .keystone
        .create_user(
            token,
            &request.username,
            &request.password,
            &request.email,
            &request.name,
            "default",
            &project.id,
        )
        .await
    {
        Ok(user) => user,
        Err(e) => {
            compensate(&ctx.keystone, token, undo).await;
            return Err(e.into());
        }
    };
    undo.push(Compensation::DeleteUser(user.id.clone()));

    // Role grants need no compensation of their own: they die with the
    // user and project deletions above.
    if let Err(e) = ctx
        .keystone
        .assign_project_role(token, &project.id, &user.id, member_role_id)
        .await
    {
        compensate(&ctx.keystone, token, undo).await;
        return Err(e.into());
    }

    if let Err(e) = ctx
        .keystone
        .assign_project_role(token, &project.id, admin_user_id, admin_role_id)
        .await
    {
        compensate(&ctx.keystone, token, undo).await;
        return Err(e.into());
    }

    if let Err(e) = ctx
        .nova
        .update_quotas(
            token,
            &project.id,
            QuotaUpdate {
                instances: config.nova_quota_instances,
                cores: config.nova_quota_cores,
                ram: config.nova_quota_ram,
            },
        )
        .await
    {
        compensate(&ctx.keystone, token, undo).await;
        return Err(e.into());
    }

    if let Err(e) = ctx
        .cinder
        .update_gigabytes_quota(
            token,
            admin.project.as_ref().map(|p| p.id.as_str()).unwrap_or(&project.id),
            &project.id,
            config.cinder_quota_gigabytes,
        )
        .await
    {
        compensate(&ctx.keystone, token, undo).await;
        return Err(e.into());
    }

    tracing::info!(
        username = %request.username,
        project_id = %project.id,
        user_id = %user.id,
        "provisioned account"
    );

    Ok(SignupResponse {
        project_id: project.id,
        user_id: user.id,
    })
}
