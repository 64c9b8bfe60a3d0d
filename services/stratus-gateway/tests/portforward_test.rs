// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Port-forwarding admission and rule lifecycle against the stub
//! deployment: the cap at the limit, delete idempotence, listing
//! round-trips, conflicts, pool exhaustion, and the serialized
//! check-then-create window.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use common::{Harness, PROJECT, TEST_TOKEN};
use neutron_client::Protocol;
use stratus_gateway::GatewayError;

/// The project's floating IPs double as the shared pool here so created
/// rules count toward its usage.
async fn pooled_harness(limit: u32) -> (Harness, stratus_gateway::ApiContext) {
    let harness = Harness::start().await;
    harness.stub.seed_token(TEST_TOKEN, PROJECT);
    harness.stub.add_floating_ip("fip-1", "203.0.113.10", PROJECT);
    let mut config = harness.config();
    config.shared_floating_ip_project_id = Some(PROJECT.to_string());
    config.port_forwarding_limit = limit;
    let ctx = harness.context(config);
    (harness, ctx)
}

async fn create_one(ctx: &stratus_gateway::ApiContext) -> Result<(), GatewayError> {
    let permit = ctx.admission.check_and_reserve(TEST_TOKEN, PROJECT).await?;
    let fip = ctx.pool.acquire_shared(TEST_TOKEN).await?;
    ctx.rules
        .create_rule(TEST_TOKEN, &fip.id, "10.0.0.5", 80, None, Protocol::Tcp)
        .await?;
    drop(permit);
    Ok(())
}

#[tokio::test]
async fn limit_plus_one_is_denied_and_count_stays() {
    let limit = 3;
    let (harness, ctx) = pooled_harness(limit).await;

    for _ in 0..limit {
        create_one(&ctx).await.expect("creation under the limit");
    }

    let err = create_one(&ctx).await.unwrap_err();
    assert!(
        matches!(err, GatewayError::AdmissionDenied { used: 3, limit: 3 }),
        "expected admission denial, got {:?}",
        err
    );
    assert_eq!(harness.stub.rule_count_for_tenant(PROJECT), limit as usize);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (harness, ctx) = pooled_harness(10).await;

    let rule = ctx
        .rules
        .create_rule(TEST_TOKEN, "fip-1", "10.0.0.5", 80, Some(10080), Protocol::Tcp)
        .await
        .unwrap();

    ctx.rules
        .delete_rule(TEST_TOKEN, "fip-1", &rule.id)
        .await
        .expect("first delete");
    ctx.rules
        .delete_rule(TEST_TOKEN, "fip-1", &rule.id)
        .await
        .expect("second delete of the same rule");
    assert_eq!(harness.stub.rule_count_for_tenant(PROJECT), 0);
}

#[tokio::test]
async fn created_rule_lists_exactly_once() {
    let (_harness, ctx) = pooled_harness(10).await;

    let created = ctx
        .rules
        .create_rule(TEST_TOKEN, "fip-1", "10.0.0.5", 8080, Some(18080), Protocol::Tcp)
        .await
        .unwrap();

    let rules = ctx.rules.list_rules(TEST_TOKEN, "fip-1").await.unwrap();
    let matching: Vec<_> = rules.iter().filter(|r| r.id == created.id).collect();
    assert_eq!(matching.len(), 1);
    let rule = matching[0];
    assert_eq!(rule.internal_ip_address, "10.0.0.5");
    assert_eq!(rule.internal_port, 8080);
    assert_eq!(rule.external_port, 18080);
    assert_eq!(rule.protocol, Protocol::Tcp);
}

#[tokio::test]
async fn duplicate_external_port_conflicts() {
    let (_harness, ctx) = pooled_harness(10).await;

    ctx.rules
        .create_rule(TEST_TOKEN, "fip-1", "10.0.0.5", 80, Some(15000), Protocol::Tcp)
        .await
        .expect("first rule");

    let err = ctx
        .rules
        .create_rule(TEST_TOKEN, "fip-1", "10.0.0.6", 81, Some(15000), Protocol::Tcp)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Conflict(_)));
}

#[tokio::test]
async fn same_port_different_protocol_is_fine() {
    let (_harness, ctx) = pooled_harness(10).await;

    ctx.rules
        .create_rule(TEST_TOKEN, "fip-1", "10.0.0.5", 53, Some(15353), Protocol::Tcp)
        .await
        .unwrap();
    ctx.rules
        .create_rule(TEST_TOKEN, "fip-1", "10.0.0.5", 53, Some(15353), Protocol::Udp)
        .await
        .expect("udp rule on the same external port");
}

#[tokio::test]
async fn exhausted_pool_reports_resource_exhausted() {
    let harness = Harness::start().await;
    harness.stub.seed_token(TEST_TOKEN, PROJECT);
    // One address in the pool, already attached to a port.
    harness.stub.add_floating_ip("fip-busy", "203.0.113.20", "p-shared");
    harness.stub.attach_floating_ip("fip-busy", "port-7");
    let mut config = harness.config();
    config.shared_floating_ip_project_id = Some("p-shared".to_string());
    let ctx = harness.context(config);

    let err = ctx.pool.acquire_shared(TEST_TOKEN).await.unwrap_err();
    assert!(matches!(err, GatewayError::ResourceExhausted));
    assert_eq!(harness.stub.rule_count_for_tenant("p-shared"), 0);
}

#[tokio::test]
async fn unconfigured_pool_is_a_configuration_error() {
    let harness = Harness::start().await;
    harness.stub.seed_token(TEST_TOKEN, PROJECT);
    let ctx = harness.context(harness.config());

    let err = ctx.pool.acquire_shared(TEST_TOKEN).await.unwrap_err();
    assert!(matches!(err, GatewayError::Configuration(_)));

    let err = ctx.pool.reserve_for_ssh(TEST_TOKEN).await.unwrap_err();
    assert!(matches!(err, GatewayError::Configuration(_)));
}

#[tokio::test]
async fn serialized_admission_closes_the_race_at_the_cap() {
    let (harness, ctx) = pooled_harness(1).await;

    // Both requests race for the last slot; with admission serialized
    // exactly one may win.
    let (a, b) = tokio::join!(create_one(&ctx), create_one(&ctx));
    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one creation may pass the cap");
    let denial = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(denial, GatewayError::AdmissionDenied { .. }));
    assert_eq!(harness.stub.rule_count_for_tenant(PROJECT), 1);
}

#[tokio::test]
async fn picked_external_ports_are_distinct() {
    let (_harness, ctx) = pooled_harness(10).await;

    let first = ctx
        .rules
        .create_rule(TEST_TOKEN, "fip-1", "10.0.0.5", 80, None, Protocol::Tcp)
        .await
        .unwrap();
    let second = ctx
        .rules
        .create_rule(TEST_TOKEN, "fip-1", "10.0.0.5", 81, None, Protocol::Tcp)
        .await
        .unwrap();
    assert_ne!(first.external_port, second.external_port);
    assert!((10000..=29999).contains(&first.external_port));
    assert!((10000..=29999).contains(&second.external_port));
}
