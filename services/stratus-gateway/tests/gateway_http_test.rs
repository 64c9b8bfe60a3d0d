// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! End-to-end tests through the gateway's HTTP surface: login, port
//! forwarding, listings, limits, and error statuses, with the stub
//! deployment upstream.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use common::Harness;
use serde_json::{Value, json};
use stratus_gateway::{ApiContext, StratusGatewayImpl, metrics};

async fn start_gateway(ctx: ApiContext) -> (dropshot::HttpServer<ApiContext>, String) {
    let api = stratus_api::stratus_api_mod::api_description::<StratusGatewayImpl>()
        .expect("gateway api description");
    let config = dropshot::ConfigDropshot {
        bind_address: "127.0.0.1:0".parse().expect("bind address"),
        default_request_body_max_bytes: 1024 * 1024,
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
        ..Default::default()
    };
    let log = dropshot::ConfigLogging::StderrTerminal {
        level: dropshot::ConfigLoggingLevel::Warn,
    }
    .to_logger("stratus-gateway-test")
    .expect("gateway logger");
    let server = dropshot::HttpServerStarter::new(&config, api, ctx, &log)
        .expect("gateway server")
        .start();
    let url = format!("http://{}", server.local_addr());
    (server, url)
}

async fn login(client: &reqwest::Client, base: &str) -> String {
    let response = client
        .post(format!("{}/login", base))
        .json(&json!({"username": "alice", "password": "hunter2"}))
        .send()
        .await
        .expect("login request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("login body");
    assert_eq!(body["profile"]["project_id"], "p-alice");
    body["token"].as_str().expect("session token").to_string()
}

#[tokio::test]
async fn port_forwarding_lifecycle_over_http() {
    let harness = Harness::start().await;
    harness.stub.add_floating_ip("fip-1", "203.0.113.10", "p-alice");
    let mut config = harness.config();
    config.shared_floating_ip_project_id = Some("p-alice".to_string());
    let (_server, base) = start_gateway(harness.context(config)).await;

    let client = reqwest::Client::new();
    let token = login(&client, &base).await;

    // Create with no external port: the gateway picks one.
    let response = client
        .post(format!("{}/port_forwardings", base))
        .bearer_auth(&token)
        .json(&json!({"internal_ip": "10.0.0.5", "internal_port": 80}))
        .send()
        .await
        .expect("create request");
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.expect("create body");
    let external_port = created["external_port"].as_u64().expect("external port");
    assert!((10000..=29999).contains(&external_port));
    assert_eq!(created["assigned_port"], created["external_port"]);
    assert_eq!(created["public_ip"], "203.0.113.10");
    assert_eq!(created["protocol"], "tcp");

    // The limits report sees the rule through the same usage count.
    let response = client
        .get(format!("{}/limits", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("limits request");
    assert_eq!(response.status(), 200);
    let limits: Value = response.json().await.expect("limits body");
    assert_eq!(limits["quotas"]["port_forwardings"]["in_use"], 1);
    assert_eq!(limits["quotas"]["port_forwardings"]["limit"], 10);

    // Delete is idempotent end to end.
    let delete_body = json!({
        "floating_ip_id": created["floating_ip_id"],
        "pf_id": created["id"],
    });
    for _ in 0..2 {
        let response = client
            .delete(format!("{}/port_forwardings", base))
            .bearer_auth(&token)
            .json(&delete_body)
            .send()
            .await
            .expect("delete request");
        assert_eq!(response.status(), 204);
    }
}

#[tokio::test]
async fn admission_denial_is_a_400() {
    let harness = Harness::start().await;
    harness.stub.add_floating_ip("fip-1", "203.0.113.10", "p-alice");
    let mut config = harness.config();
    config.shared_floating_ip_project_id = Some("p-alice".to_string());
    config.port_forwarding_limit = 0;
    let (_server, base) = start_gateway(harness.context(config)).await;

    let client = reqwest::Client::new();
    let token = login(&client, &base).await;

    let response = client
        .post(format!("{}/port_forwardings", base))
        .bearer_auth(&token)
        .json(&json!({"internal_ip": "10.0.0.5", "internal_port": 80}))
        .send()
        .await
        .expect("create request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("error body");
    assert!(
        body["message"]
            .as_str()
            .expect("message")
            .contains("limit reached")
    );
}

#[tokio::test]
async fn bad_password_is_a_401() {
    let harness = Harness::start().await;
    let (_server, base) = start_gateway(harness.context(harness.config())).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/login", base))
        .json(&json!({"username": "alice", "password": "wrong"}))
        .send()
        .await
        .expect("login request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn missing_session_is_a_401() {
    let harness = Harness::start().await;
    let (_server, base) = start_gateway(harness.context(harness.config())).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/flavors", base))
        .send()
        .await
        .expect("flavors request");
    assert_eq!(response.status(), 401);

    let response = client
        .get(format!("{}/flavors", base))
        .bearer_auth("not-a-session-token")
        .send()
        .await
        .expect("flavors request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn listings_project_upstream_catalogs() {
    let harness = Harness::start().await;
    let (_server, base) = start_gateway(harness.context(harness.config())).await;

    let client = reqwest::Client::new();
    let token = login(&client, &base).await;

    let flavors: Value = client
        .get(format!("{}/flavors", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("flavors request")
        .json()
        .await
        .expect("flavors body");
    assert_eq!(flavors["flavors"].as_array().expect("flavors array").len(), 2);
    assert_eq!(flavors["flavors"][0]["name"], "m1.small");

    let images: Value = client
        .get(format!("{}/images", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("images request")
        .json()
        .await
        .expect("images body");
    assert_eq!(images["images"][0]["id"], "img-ubuntu");

    let networks: Value = client
        .get(format!("{}/networks", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("networks request")
        .json()
        .await
        .expect("networks body");
    assert_eq!(networks["networks"][0]["id"], "net-1");

    let keypairs: Value = client
        .get(format!("{}/keypairs", base))
        .bearer_auth(&token)
        .send()
        .await
        .expect("keypairs request")
        .json()
        .await
        .expect("keypairs body");
    assert_eq!(keypairs["keypairs"][0]["name"], "alice-key");
}

#[tokio::test]
async fn metrics_are_exposed_as_prometheus_text() {
    // Registration is process-wide; a second registration in the same
    // test binary is fine to ignore.
    let _ = metrics::register();

    let harness = Harness::start().await;
    let (_server, base) = start_gateway(harness.context(harness.config())).await;

    let response = reqwest::Client::new()
        .get(format!("{}/metrics", base))
        .send()
        .await
        .expect("metrics request");
    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("metrics body");
    assert!(body.contains("stratus_gateway"));
}
