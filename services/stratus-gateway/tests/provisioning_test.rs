// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Provisioning orchestrator scenarios against the stub deployment:
//! SSH setup, partial port exposure, network-readiness timeout, pool
//! exhaustion, and idempotent resubmission.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use common::{Harness, PROJECT, TEST_TOKEN, wait_terminal};
use stratus_api::{InstanceCreate, PortOutcomeStatus, ProvisioningStatus};
use uuid::Uuid;

fn instance_request(ports: Vec<u16>) -> InstanceCreate {
    InstanceCreate {
        name: None,
        image_id: "img-ubuntu".to_string(),
        flavor_id: "flv-small".to_string(),
        key_name: "alice-key".to_string(),
        network_id: "net-1".to_string(),
        exposed_ports: ports,
        request_id: None,
    }
}

async fn submit(
    ctx: &stratus_gateway::ApiContext,
    request: InstanceCreate,
) -> (Uuid, ProvisioningStatus) {
    ctx.provisioner
        .submit(
            TEST_TOKEN.to_string(),
            PROJECT.to_string(),
            "alice".to_string(),
            request,
        )
        .await
}

#[tokio::test]
async fn ssh_setup_creates_exactly_one_rule_on_the_designated_ip() {
    let harness = Harness::start().await;
    harness.stub.seed_token(TEST_TOKEN, PROJECT);
    harness.stub.add_floating_ip("fip-ssh", "203.0.113.2", "p-shared");
    let mut config = harness.config();
    config.ssh_floating_ip_id = Some("fip-ssh".to_string());
    let ctx = harness.context(config);

    let (request_id, status) = submit(&ctx, instance_request(vec![])).await;
    assert_eq!(status, ProvisioningStatus::Pending);

    let info = wait_terminal(&ctx.provisioner, request_id).await;
    assert_eq!(info.status, ProvisioningStatus::Complete);
    assert!(info.ports.is_empty());

    let ssh = info.ssh.expect("ssh access");
    assert_eq!(ssh.floating_ip_address, "203.0.113.2");

    let rules = harness.stub.rules_on("fip-ssh");
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].internal_port, 22);
    assert_eq!(rules[0].internal_ip_address, info.fixed_ip.expect("fixed ip"));
}

#[tokio::test]
async fn three_ports_under_limit_two_yields_partial_success() {
    let harness = Harness::start().await;
    harness.stub.seed_token(TEST_TOKEN, PROJECT);
    harness.stub.add_floating_ip("fip-1", "203.0.113.10", PROJECT);
    let mut config = harness.config();
    // No SSH address configured: SSH setup fails best-effort and the
    // request proceeds.
    config.shared_floating_ip_project_id = Some(PROJECT.to_string());
    config.port_forwarding_limit = 2;
    let ctx = harness.context(config);

    let (request_id, _) = submit(&ctx, instance_request(vec![80, 443, 8080])).await;
    let info = wait_terminal(&ctx.provisioner, request_id).await;

    assert_eq!(info.status, ProvisioningStatus::Complete);
    assert!(info.ssh.is_none());
    assert!(info.ssh_error.is_some());

    let statuses: Vec<PortOutcomeStatus> = info.ports.iter().map(|p| p.status).collect();
    assert_eq!(
        statuses,
        vec![
            PortOutcomeStatus::Created,
            PortOutcomeStatus::Created,
            PortOutcomeStatus::Denied,
        ]
    );
    // The result names which ports made it.
    assert_eq!(info.ports[0].internal_port, 80);
    assert!(info.ports[0].external_port.is_some());
    assert_eq!(info.ports[1].internal_port, 443);
    assert!(info.ports[2].external_port.is_none());
    assert_eq!(harness.stub.rule_count_for_tenant(PROJECT), 2);
}

#[tokio::test]
async fn denial_skips_remaining_ports() {
    let harness = Harness::start().await;
    harness.stub.seed_token(TEST_TOKEN, PROJECT);
    harness.stub.add_floating_ip("fip-1", "203.0.113.10", PROJECT);
    let mut config = harness.config();
    config.shared_floating_ip_project_id = Some(PROJECT.to_string());
    config.port_forwarding_limit = 1;
    let ctx = harness.context(config);

    let (request_id, _) = submit(&ctx, instance_request(vec![80, 443, 8080])).await;
    let info = wait_terminal(&ctx.provisioner, request_id).await;

    let statuses: Vec<PortOutcomeStatus> = info.ports.iter().map(|p| p.status).collect();
    assert_eq!(
        statuses,
        vec![
            PortOutcomeStatus::Created,
            PortOutcomeStatus::Denied,
            PortOutcomeStatus::Skipped,
        ]
    );
}

#[tokio::test]
async fn missing_fixed_address_times_out_without_touching_the_instance() {
    let harness = Harness::start().await;
    harness.stub.seed_token(TEST_TOKEN, PROJECT);
    harness.stub.set_publish_address_after(u64::MAX);
    let mut config = harness.config();
    config.fixed_ip_poll_attempts = 3;
    let ctx = harness.context(config);

    let (request_id, _) = submit(&ctx, instance_request(vec![])).await;
    let info = wait_terminal(&ctx.provisioner, request_id).await;

    assert_eq!(info.status, ProvisioningStatus::Failed);
    assert!(info.error.expect("failure detail").contains("timed out"));
    // The instance was created and stays created; no rollback.
    assert_eq!(harness.stub.server_count(), 1);
    assert!(info.instance_id.is_some());
}

#[tokio::test]
async fn exhausted_pool_marks_port_failed_and_completes() {
    let harness = Harness::start().await;
    harness.stub.seed_token(TEST_TOKEN, PROJECT);
    let mut config = harness.config();
    // Pool project configured but owns no addresses at all.
    config.shared_floating_ip_project_id = Some("p-empty".to_string());
    let ctx = harness.context(config);

    let (request_id, _) = submit(&ctx, instance_request(vec![80])).await;
    let info = wait_terminal(&ctx.provisioner, request_id).await;

    assert_eq!(info.status, ProvisioningStatus::Complete);
    assert_eq!(info.ports.len(), 1);
    assert_eq!(info.ports[0].status, PortOutcomeStatus::Failed);
    assert!(
        info.ports[0]
            .message
            .as_deref()
            .expect("failure message")
            .contains("no free floating IP")
    );
}

#[tokio::test]
async fn resubmitting_a_request_id_does_not_provision_twice() {
    let harness = Harness::start().await;
    harness.stub.seed_token(TEST_TOKEN, PROJECT);
    let ctx = harness.context(harness.config());

    let request_id = Uuid::new_v4();
    let mut request = instance_request(vec![]);
    request.request_id = Some(request_id);

    let (first_id, _) = submit(&ctx, request.clone()).await;
    assert_eq!(first_id, request_id);
    let info = wait_terminal(&ctx.provisioner, request_id).await;
    assert_eq!(info.status, ProvisioningStatus::Complete);

    // Terminal record: resubmission reports the existing state and
    // provisions nothing new.
    let (second_id, status) = submit(&ctx, request).await;
    assert_eq!(second_id, request_id);
    assert_eq!(status, ProvisioningStatus::Complete);
    assert_eq!(harness.stub.server_count(), 1);
}
