// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Quota/usage aggregation
//!
//! Read-only fan-out across the compute, volume, and network services,
//! summed into per-resource `{in_use, limit}` pairs. Port-forwarding
//! usage comes from the rule store (the same derived count admission
//! control uses); its limit is gateway configuration, not a provider
//! quota.

use crate::context::ApiContext;
use crate::errors::GatewayError;
use std::collections::BTreeMap;
use stratus_api::{LimitSummary, QuotaUsage};
use stratus_auth_session::Profile;

pub async fn limit_summary(
    ctx: &ApiContext,
    profile: &Profile,
) -> Result<LimitSummary, GatewayError> {
    let token = profile.keystone_token.as_str();
    let project = profile.project_id.as_str();

    let nova_quotas = ctx.nova.get_quotas(token, project).await?;
    let cinder_quotas = ctx.cinder.get_quotas(token, project).await?;
    let neutron_quotas = ctx.neutron.get_quotas(token, project).await?;

    let servers = ctx.nova.list_servers(token).await?;
    let instances_used = servers.len() as i64;
    let cores_used: i64 = servers.iter().map(|s| s.flavor.vcpus as i64).sum();
    let ram_used: i64 = servers.iter().map(|s| s.flavor.ram as i64).sum();

    let volumes = ctx.cinder.list_volumes(token, project).await?;
    let volumes_used = volumes.len() as i64;
    let gigabytes_used: i64 = volumes.iter().map(|v| v.size as i64).sum();
    let snapshots_used = ctx.cinder.list_snapshots(token, project).await?.len() as i64;

    let floating_ips_used = ctx
        .neutron
        .list_floating_ips(token, Some(project))
        .await?
        .len() as i64;
    let port_forwardings_used = ctx.rules.project_usage(token, project).await? as i64;

    let networks_used = ctx.neutron.list_networks(token, Some(project)).await?.len() as i64;
    let ports_used = ctx.neutron.list_ports(token, project).await?.len() as i64;
    let routers_used = ctx.neutron.list_routers(token, project).await?.len() as i64;
    let subnets_used = ctx.neutron.list_subnets(token, project).await?.len() as i64;
    let security_groups_used = ctx
        .neutron
        .list_security_groups(token, project)
        .await?
        .len() as i64;

    let mut quotas = BTreeMap::new();
    let mut put = |name: &str, in_use: i64, limit: i64| {
        quotas.insert(name.to_string(), QuotaUsage { in_use, limit });
    };
    put("instances", instances_used, nova_quotas.instances);
    put("cores", cores_used, nova_quotas.cores);
    put("ram", ram_used, nova_quotas.ram);
    put("volumes", volumes_used, cinder_quotas.volumes);
    put("snapshots", snapshots_used, cinder_quotas.snapshots);
    put("gigabytes", gigabytes_used, cinder_quotas.gigabytes);
    put("floatingip", floating_ips_used, neutron_quotas.floatingip);
    put(
        "port_forwardings",
        port_forwardings_used,
        ctx.config.port_forwarding_limit as i64,
    );
    put("network", networks_used, neutron_quotas.network);
    put("port", ports_used, neutron_quotas.port);
    put("router", routers_used, neutron_quotas.router);
    put("subnet", subnets_used, neutron_quotas.subnet);
    put("security_group", security_groups_used, neutron_quotas.security_group);
    // Rule-level usage is not cheap to compute; report the limit only.
    put("security_group_rule", -1, neutron_quotas.security_group_rule);

    Ok(LimitSummary { quotas })
}
