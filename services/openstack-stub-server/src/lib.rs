// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Stub OpenStack deployment for testing
//!
//! A single Dropshot server that impersonates the subset of Keystone,
//! Nova, Neutron, Cinder, and Glance the gateway's clients call, under
//! the devstack-style per-service path prefixes (`/identity`, `/compute`,
//! `/neutron`, `/cinder`, `/image`). State is held in memory and mutable,
//! so create/delete/conflict/404 paths behave like the real services:
//! in particular the stub enforces Neutron's uniqueness constraint on
//! (floating IP, external port, protocol), which is what makes conflict
//! tests against it authoritative.
//!
//! Used by:
//! - Integration testing of stratus-gateway without a real deployment
//! - Local development and demos

use dropshot::{
    ApiDescription, Body, HttpError, HttpResponseCreated, HttpResponseDeleted, HttpResponseOk,
    HttpResponseUpdatedNoContent, Path, Query, RequestContext, TypedBody,
};
use http::Response;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

// ============================================================================
// Stub State
// ============================================================================

/// A seeded login account
#[derive(Debug, Clone)]
struct StubAccount {
    password: String,
    user_id: String,
    project_id: String,
    project_name: String,
}

/// Port-forwarding rule held on a stub floating IP
#[derive(Debug, Clone)]
pub struct StubRule {
    pub id: String,
    pub protocol: String,
    pub internal_ip_address: String,
    pub internal_port: u16,
    pub external_port: u16,
}

/// Floating IP with its attached rules
#[derive(Debug, Clone)]
struct StubFloatingIp {
    id: String,
    floating_ip_address: String,
    tenant_id: String,
    port_id: Option<String>,
    rules: Vec<StubRule>,
}

/// Compute instance
#[derive(Debug, Clone)]
struct StubServer {
    id: String,
    name: String,
    fixed_ip: String,
    /// GETs remaining before the stub publishes the fixed address,
    /// imitating Nova's asynchronous wiring. u64::MAX never publishes.
    polls_until_address: u64,
}

#[derive(Debug, Default)]
struct StubState {
    tokens: HashMap<String, String>,
    accounts: HashMap<String, StubAccount>,
    projects: HashMap<String, String>,
    users: HashMap<String, String>,
    role_grants: Vec<(String, String, String)>,
    servers: HashMap<String, StubServer>,
    floating_ips: HashMap<String, StubFloatingIp>,
    nova_quotas: HashMap<String, Value>,
    cinder_quotas: HashMap<String, Value>,
    /// How many GETs a new server takes to publish its address
    publish_address_after: u64,
    /// Test knob: make role grants fail to exercise signup rollback
    fail_role_grants: bool,
}

/// Context for the stub deployment
pub struct StubContext {
    state: Mutex<StubState>,
    counter: AtomicU64,
}

impl Default for StubContext {
    fn default() -> Self {
        Self::new()
    }
}

impl StubContext {
    /// Create a stub seeded with one end-user account ("alice"), one
    /// operations account ("system"), and small static catalogs.
    pub fn new() -> Self {
        let mut state = StubState {
            publish_address_after: 1,
            ..Default::default()
        };
        state.accounts.insert(
            "alice".to_string(),
            StubAccount {
                password: "hunter2".to_string(),
                user_id: "u-alice".to_string(),
                project_id: "p-alice".to_string(),
                project_name: "alice-project".to_string(),
            },
        );
        state.accounts.insert(
            "system".to_string(),
            StubAccount {
                password: "system-password".to_string(),
                user_id: "u-system".to_string(),
                project_id: "p-service".to_string(),
                project_name: "service".to_string(),
            },
        );
        state.projects.insert("p-alice".to_string(), "alice-project".to_string());
        state.projects.insert("p-service".to_string(), "service".to_string());
        state.users.insert("u-alice".to_string(), "alice".to_string());
        state.users.insert("u-system".to_string(), "system".to_string());
        Self {
            state: Mutex::new(state),
            counter: AtomicU64::new(1),
        }
    }

    // Stub state is never poisoned: handlers do not panic while holding it.
    fn state(&self) -> MutexGuard<'_, StubState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.counter.fetch_add(1, Ordering::Relaxed))
    }

    // ------------------------------------------------------------------
    // Test helpers
    // ------------------------------------------------------------------

    /// Accept `token` as a valid credential scoped to `project_id`
    pub fn seed_token(&self, token: &str, project_id: &str) {
        self.state()
            .tokens
            .insert(token.to_string(), project_id.to_string());
    }

    /// Register a bare user (no login account, no project)
    pub fn seed_user(&self, user_id: &str, name: &str) {
        self.state()
            .users
            .insert(user_id.to_string(), name.to_string());
    }

    /// Add a floating IP to the stub's network service
    pub fn add_floating_ip(&self, id: &str, address: &str, tenant_id: &str) {
        self.state().floating_ips.insert(
            id.to_string(),
            StubFloatingIp {
                id: id.to_string(),
                floating_ip_address: address.to_string(),
                tenant_id: tenant_id.to_string(),
                port_id: None,
                rules: Vec::new(),
            },
        );
    }

    /// Mark a floating IP as attached to a port (so it is not "free")
    pub fn attach_floating_ip(&self, id: &str, port_id: &str) {
        if let Some(fip) = self.state().floating_ips.get_mut(id) {
            fip.port_id = Some(port_id.to_string());
        }
    }

    /// Rules currently held on a floating IP
    pub fn rules_on(&self, floating_ip_id: &str) -> Vec<StubRule> {
        self.state()
            .floating_ips
            .get(floating_ip_id)
            .map(|fip| fip.rules.clone())
            .unwrap_or_default()
    }

    /// Total rules across floating IPs owned by a project
    pub fn rule_count_for_tenant(&self, tenant_id: &str) -> usize {
        self.state()
            .floating_ips
            .values()
            .filter(|fip| fip.tenant_id == tenant_id)
            .map(|fip| fip.rules.len())
            .sum()
    }

    /// How many GETs a newly created server takes to publish its address
    pub fn set_publish_address_after(&self, polls: u64) {
        self.state().publish_address_after = polls;
    }

    /// Make every role grant fail, to exercise signup compensation
    pub fn set_fail_role_grants(&self, fail: bool) {
        self.state().fail_role_grants = fail;
    }

    /// Whether a project with this name exists
    pub fn has_project_named(&self, name: &str) -> bool {
        self.state().projects.values().any(|n| n == name)
    }

    /// Whether a user with this name exists
    pub fn has_user_named(&self, name: &str) -> bool {
        self.state().users.values().any(|n| n == name)
    }

    /// Number of compute instances created so far
    pub fn server_count(&self) -> usize {
        self.state().servers.len()
    }

    /// Role grants recorded on a project
    pub fn role_grant_count(&self, project_id: &str) -> usize {
        self.state()
            .role_grants
            .iter()
            .filter(|(project, _, _)| project == project_id)
            .count()
    }
}

fn require_token(
    ctx: &StubContext,
    rqctx: &RequestContext<Arc<StubContext>>,
) -> Result<String, HttpError> {
    let token = rqctx
        .request
        .headers()
        .get("X-Auth-Token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    match token {
        Some(t) if ctx.state().tokens.contains_key(&t) => Ok(t),
        _ => Err(HttpError::for_client_error(
            None,
            dropshot::ClientErrorStatusCode::UNAUTHORIZED,
            "invalid or missing X-Auth-Token".to_string(),
        )),
    }
}

fn json_response(status: http::StatusCode, body: &Value) -> Result<Response<Body>, HttpError> {
    let bytes = serde_json::to_vec(body)
        .map_err(|e| HttpError::for_internal_error(format!("stub serialization: {}", e)))?;
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(bytes.into())
        .map_err(|e| HttpError::for_internal_error(format!("stub response: {}", e)))
}

// ============================================================================
// Identity (Keystone)
// ============================================================================

#[derive(Deserialize, JsonSchema)]
struct ProjectPathParam {
    project_id: String,
}

#[derive(Deserialize, JsonSchema)]
struct UserPathParam {
    user_id: String,
}

#[derive(Deserialize, JsonSchema)]
struct RoleGrantPathParam {
    project_id: String,
    user_id: String,
    role_id: String,
}

/// Issue a token for a password grant
#[dropshot::endpoint {
    method = POST,
    path = "/identity/v3/auth/tokens",
}]
async fn identity_issue_token(
    rqctx: RequestContext<Arc<StubContext>>,
    body: TypedBody<Value>,
) -> Result<Response<Body>, HttpError> {
    let ctx = rqctx.context();
    let body = body.into_inner();
    let user = &body["auth"]["identity"]["password"]["user"];
    let username = user["name"].as_str().unwrap_or_default().to_string();
    let password = user["password"].as_str().unwrap_or_default().to_string();

    let account = {
        let state = ctx.state();
        match state.accounts.get(&username) {
            Some(account) if account.password == password => account.clone(),
            _ => {
                return Err(HttpError::for_client_error(
                    None,
                    dropshot::ClientErrorStatusCode::UNAUTHORIZED,
                    "The request you have made requires authentication.".to_string(),
                ));
            }
        }
    };

    let token = ctx.next_id("tok");
    ctx.state()
        .tokens
        .insert(token.clone(), account.project_id.clone());

    let payload = json!({
        "token": {
            "user": {"id": account.user_id, "name": username},
            "project": {"id": account.project_id, "name": account.project_name},
            "expires_at": "2027-01-01T00:00:00Z",
        }
    });
    let bytes = serde_json::to_vec(&payload)
        .map_err(|e| HttpError::for_internal_error(format!("stub serialization: {}", e)))?;
    Response::builder()
        .status(http::StatusCode::CREATED)
        .header("X-Subject-Token", token)
        .header("Content-Type", "application/json")
        .body(bytes.into())
        .map_err(|e| HttpError::for_internal_error(format!("stub response: {}", e)))
}

/// Create a project
#[dropshot::endpoint {
    method = POST,
    path = "/identity/v3/projects",
}]
async fn identity_create_project(
    rqctx: RequestContext<Arc<StubContext>>,
    body: TypedBody<Value>,
) -> Result<HttpResponseCreated<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let body = body.into_inner();
    let name = body["project"]["name"].as_str().unwrap_or_default().to_string();
    let state = ctx.state();
    if state.projects.values().any(|n| *n == name) {
        return Err(HttpError::for_client_error(
            None,
            dropshot::ClientErrorStatusCode::CONFLICT,
            format!("project {} already exists", name),
        ));
    }
    drop(state);
    let id = ctx.next_id("proj");
    ctx.state().projects.insert(id.clone(), name.clone());
    Ok(HttpResponseCreated(json!({"project": {"id": id, "name": name}})))
}

/// Create a user
#[dropshot::endpoint {
    method = POST,
    path = "/identity/v3/users",
}]
async fn identity_create_user(
    rqctx: RequestContext<Arc<StubContext>>,
    body: TypedBody<Value>,
) -> Result<HttpResponseCreated<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let body = body.into_inner();
    let name = body["user"]["name"].as_str().unwrap_or_default().to_string();
    if ctx.state().users.values().any(|n| *n == name) {
        return Err(HttpError::for_client_error(
            None,
            dropshot::ClientErrorStatusCode::CONFLICT,
            format!("user {} already exists", name),
        ));
    }
    let id = ctx.next_id("usr");
    ctx.state().users.insert(id.clone(), name.clone());
    Ok(HttpResponseCreated(json!({"user": {"id": id, "name": name}})))
}

/// Grant a role on a project
#[dropshot::endpoint {
    method = PUT,
    path = "/identity/v3/projects/{project_id}/users/{user_id}/roles/{role_id}",
}]
async fn identity_grant_role(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<RoleGrantPathParam>,
) -> Result<HttpResponseUpdatedNoContent, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let path = path.into_inner();
    let mut state = ctx.state();
    if state.fail_role_grants {
        return Err(HttpError::for_internal_error(
            "role backend unavailable".to_string(),
        ));
    }
    state
        .role_grants
        .push((path.project_id, path.user_id, path.role_id));
    Ok(HttpResponseUpdatedNoContent())
}

/// Delete a project
#[dropshot::endpoint {
    method = DELETE,
    path = "/identity/v3/projects/{project_id}",
}]
async fn identity_delete_project(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<ProjectPathParam>,
) -> Result<HttpResponseDeleted, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let id = path.into_inner().project_id;
    if ctx.state().projects.remove(&id).is_none() {
        return Err(HttpError::for_not_found(None, format!("no project {}", id)));
    }
    Ok(HttpResponseDeleted())
}

/// Delete a user
#[dropshot::endpoint {
    method = DELETE,
    path = "/identity/v3/users/{user_id}",
}]
async fn identity_delete_user(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<UserPathParam>,
) -> Result<HttpResponseDeleted, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let id = path.into_inner().user_id;
    if ctx.state().users.remove(&id).is_none() {
        return Err(HttpError::for_not_found(None, format!("no user {}", id)));
    }
    Ok(HttpResponseDeleted())
}

// ============================================================================
// Compute (Nova)
// ============================================================================

#[derive(Deserialize, JsonSchema)]
struct ServerPathParam {
    server_id: String,
}

fn server_json(server: &StubServer, publish: bool) -> Value {
    let addresses = if publish {
        json!({
            "private": [
                {"addr": server.fixed_ip, "OS-EXT-IPS:type": "fixed"},
            ]
        })
    } else {
        json!({})
    };
    json!({
        "id": server.id,
        "name": server.name,
        "status": if publish { "ACTIVE" } else { "BUILD" },
        "addresses": addresses,
        "flavor": {"vcpus": 2, "ram": 2048},
    })
}

/// Create a server
#[dropshot::endpoint {
    method = POST,
    path = "/compute/servers",
}]
async fn compute_create_server(
    rqctx: RequestContext<Arc<StubContext>>,
    body: TypedBody<Value>,
) -> Result<Response<Body>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let body = body.into_inner();
    let name = body["server"]["name"].as_str().unwrap_or("unnamed").to_string();
    let id = ctx.next_id("srv");
    let octet = 10 + ctx.state().servers.len() as u64;
    let server = StubServer {
        id: id.clone(),
        name,
        fixed_ip: format!("10.0.0.{}", octet),
        polls_until_address: ctx.state().publish_address_after,
    };
    let payload = json!({"server": server_json(&server, false)});
    ctx.state().servers.insert(id, server);
    json_response(http::StatusCode::ACCEPTED, &payload)
}

/// Get a server (or the detail listing; Nova's `/servers/detail` shares
/// this route's shape, so the stub folds the two)
#[dropshot::endpoint {
    method = GET,
    path = "/compute/servers/{server_id}",
}]
async fn compute_get_server(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<ServerPathParam>,
) -> Result<Response<Body>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let id = path.into_inner().server_id;

    if id == "detail" {
        let state = ctx.state();
        let servers: Vec<Value> = state
            .servers
            .values()
            .map(|s| server_json(s, s.polls_until_address == 0))
            .collect();
        return json_response(http::StatusCode::OK, &json!({"servers": servers}));
    }

    let mut state = ctx.state();
    let server = state
        .servers
        .get_mut(&id)
        .ok_or_else(|| HttpError::for_not_found(None, format!("no server {}", id)))?;
    let publish = if server.polls_until_address == 0 {
        true
    } else {
        if server.polls_until_address != u64::MAX {
            server.polls_until_address -= 1;
        }
        server.polls_until_address == 0
    };
    let payload = json!({"server": server_json(server, publish)});
    drop(state);
    json_response(http::StatusCode::OK, &payload)
}

/// Flavor detail listing
#[dropshot::endpoint {
    method = GET,
    path = "/compute/flavors/detail",
}]
async fn compute_list_flavors(
    rqctx: RequestContext<Arc<StubContext>>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    Ok(HttpResponseOk(json!({
        "flavors": [
            {"id": "flv-small", "name": "m1.small", "vcpus": 1, "ram": 2048, "disk": 20},
            {"id": "flv-medium", "name": "m1.medium", "vcpus": 2, "ram": 4096, "disk": 40},
        ]
    })))
}

/// Keypair listing
#[dropshot::endpoint {
    method = GET,
    path = "/compute/os-keypairs",
}]
async fn compute_list_keypairs(
    rqctx: RequestContext<Arc<StubContext>>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    Ok(HttpResponseOk(json!({
        "keypairs": [
            {"keypair": {"name": "alice-key", "fingerprint": "aa:bb:cc:dd"}},
        ]
    })))
}

/// Compute quota set
#[dropshot::endpoint {
    method = GET,
    path = "/compute/os-quota-sets/{project_id}",
}]
async fn compute_get_quotas(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<ProjectPathParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let id = path.into_inner().project_id;
    let state = ctx.state();
    let quota = state
        .nova_quotas
        .get(&id)
        .cloned()
        .unwrap_or_else(|| json!({"instances": 10, "cores": 4, "ram": 6144}));
    Ok(HttpResponseOk(json!({"quota_set": quota})))
}

/// Update a compute quota set
#[dropshot::endpoint {
    method = PUT,
    path = "/compute/os-quota-sets/{project_id}",
}]
async fn compute_update_quotas(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<ProjectPathParam>,
    body: TypedBody<Value>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let id = path.into_inner().project_id;
    let quota = body.into_inner()["quota_set"].clone();
    ctx.state().nova_quotas.insert(id, quota.clone());
    Ok(HttpResponseOk(json!({"quota_set": quota})))
}

/// Open a remote console
#[dropshot::endpoint {
    method = POST,
    path = "/compute/servers/{server_id}/remote-consoles",
}]
async fn compute_remote_console(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<ServerPathParam>,
    body: TypedBody<Value>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let id = path.into_inner().server_id;
    if !ctx.state().servers.contains_key(&id) {
        return Err(HttpError::for_not_found(None, format!("no server {}", id)));
    }
    let console_type = body.into_inner()["remote_console"]["type"]
        .as_str()
        .unwrap_or("novnc")
        .to_string();
    Ok(HttpResponseOk(json!({
        "remote_console": {
            "protocol": "vnc",
            "type": console_type,
            "url": format!("http://stub-console/{}", id),
        }
    })))
}

// ============================================================================
// Network (Neutron)
// ============================================================================

#[derive(Deserialize, JsonSchema)]
struct FipPathParam {
    fip_id: String,
}

#[derive(Deserialize, JsonSchema)]
struct PfPathParam {
    fip_id: String,
    pf_id: String,
}

#[derive(Deserialize, JsonSchema)]
struct TenantQueryParam {
    #[serde(default)]
    tenant_id: Option<String>,
}

fn fip_json(fip: &StubFloatingIp) -> Value {
    json!({
        "id": fip.id,
        "floating_ip_address": fip.floating_ip_address,
        "tenant_id": fip.tenant_id,
        "port_id": fip.port_id,
        "fixed_ip_address": null,
        "status": if fip.rules.is_empty() && fip.port_id.is_none() { "DOWN" } else { "ACTIVE" },
    })
}

fn rule_json(rule: &StubRule) -> Value {
    json!({
        "id": rule.id,
        "protocol": rule.protocol,
        "internal_ip_address": rule.internal_ip_address,
        "internal_port": rule.internal_port,
        "external_port": rule.external_port,
        "status": "ACTIVE",
    })
}

/// Floating IP listing, optionally filtered by tenant
#[dropshot::endpoint {
    method = GET,
    path = "/neutron/v2.0/floatingips",
}]
async fn network_list_fips(
    rqctx: RequestContext<Arc<StubContext>>,
    query: Query<TenantQueryParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let tenant = query.into_inner().tenant_id;
    let state = ctx.state();
    let mut fips: Vec<&StubFloatingIp> = state
        .floating_ips
        .values()
        .filter(|fip| tenant.as_deref().is_none_or(|t| fip.tenant_id == t))
        .collect();
    fips.sort_by(|a, b| a.id.cmp(&b.id));
    let fips: Vec<Value> = fips.into_iter().map(fip_json).collect();
    Ok(HttpResponseOk(json!({"floatingips": fips})))
}

/// Fetch one floating IP
#[dropshot::endpoint {
    method = GET,
    path = "/neutron/v2.0/floatingips/{fip_id}",
}]
async fn network_show_fip(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<FipPathParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let id = path.into_inner().fip_id;
    let state = ctx.state();
    let fip = state
        .floating_ips
        .get(&id)
        .ok_or_else(|| HttpError::for_not_found(None, format!("no floating IP {}", id)))?;
    Ok(HttpResponseOk(json!({"floatingip": fip_json(fip)})))
}

/// List rules on a floating IP
#[dropshot::endpoint {
    method = GET,
    path = "/neutron/v2.0/floatingips/{fip_id}/port_forwardings",
}]
async fn network_list_pfs(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<FipPathParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let id = path.into_inner().fip_id;
    let state = ctx.state();
    let fip = state
        .floating_ips
        .get(&id)
        .ok_or_else(|| HttpError::for_not_found(None, format!("no floating IP {}", id)))?;
    let rules: Vec<Value> = fip.rules.iter().map(rule_json).collect();
    Ok(HttpResponseOk(json!({"port_forwardings": rules})))
}

/// Create a rule, enforcing upstream uniqueness
#[dropshot::endpoint {
    method = POST,
    path = "/neutron/v2.0/floatingips/{fip_id}/port_forwardings",
}]
async fn network_create_pf(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<FipPathParam>,
    body: TypedBody<Value>,
) -> Result<HttpResponseCreated<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let fip_id = path.into_inner().fip_id;
    let body = body.into_inner();
    let pf = &body["port_forwarding"];
    let protocol = pf["protocol"].as_str().unwrap_or("tcp").to_string();
    let internal_ip = pf["internal_ip_address"].as_str().unwrap_or_default().to_string();
    let internal_port = pf["internal_port"].as_u64().unwrap_or_default() as u16;
    let external_port = pf["external_port"].as_u64().unwrap_or_default() as u16;

    let rule_id = ctx.next_id("pf");
    let mut state = ctx.state();
    let fip = state
        .floating_ips
        .get_mut(&fip_id)
        .ok_or_else(|| HttpError::for_not_found(None, format!("no floating IP {}", fip_id)))?;
    if fip
        .rules
        .iter()
        .any(|r| r.external_port == external_port && r.protocol == protocol)
    {
        return Err(HttpError::for_client_error(
            None,
            dropshot::ClientErrorStatusCode::CONFLICT,
            format!(
                "A duplicate port forwarding entry with protocol {} and external port {} exists",
                protocol, external_port
            ),
        ));
    }
    let rule = StubRule {
        id: rule_id,
        protocol,
        internal_ip_address: internal_ip,
        internal_port,
        external_port,
    };
    let payload = json!({"port_forwarding": rule_json(&rule)});
    fip.rules.push(rule);
    Ok(HttpResponseCreated(payload))
}

/// Delete a rule; absent rules are a 404, as upstream reports them
#[dropshot::endpoint {
    method = DELETE,
    path = "/neutron/v2.0/floatingips/{fip_id}/port_forwardings/{pf_id}",
}]
async fn network_delete_pf(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<PfPathParam>,
) -> Result<HttpResponseDeleted, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let path = path.into_inner();
    let mut state = ctx.state();
    let fip = state
        .floating_ips
        .get_mut(&path.fip_id)
        .ok_or_else(|| HttpError::for_not_found(None, format!("no floating IP {}", path.fip_id)))?;
    let before = fip.rules.len();
    fip.rules.retain(|r| r.id != path.pf_id);
    if fip.rules.len() == before {
        return Err(HttpError::for_not_found(
            None,
            format!("no port forwarding {}", path.pf_id),
        ));
    }
    Ok(HttpResponseDeleted())
}

/// Network listing
#[dropshot::endpoint {
    method = GET,
    path = "/neutron/v2.0/networks",
}]
async fn network_list_networks(
    rqctx: RequestContext<Arc<StubContext>>,
    query: Query<TenantQueryParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let _ = query.into_inner();
    Ok(HttpResponseOk(json!({
        "networks": [
            {"id": "net-1", "name": "private", "status": "ACTIVE", "shared": false,
             "subnets": ["subnet-1"]},
        ]
    })))
}

/// Port listing (count-oriented)
#[dropshot::endpoint {
    method = GET,
    path = "/neutron/v2.0/ports",
}]
async fn network_list_ports(
    rqctx: RequestContext<Arc<StubContext>>,
    query: Query<TenantQueryParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let _ = query.into_inner();
    Ok(HttpResponseOk(json!({"ports": [{"id": "port-1"}, {"id": "port-2"}]})))
}

/// Router listing (count-oriented)
#[dropshot::endpoint {
    method = GET,
    path = "/neutron/v2.0/routers",
}]
async fn network_list_routers(
    rqctx: RequestContext<Arc<StubContext>>,
    query: Query<TenantQueryParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let _ = query.into_inner();
    Ok(HttpResponseOk(json!({"routers": [{"id": "router-1"}]})))
}

/// Subnet listing (count-oriented)
#[dropshot::endpoint {
    method = GET,
    path = "/neutron/v2.0/subnets",
}]
async fn network_list_subnets(
    rqctx: RequestContext<Arc<StubContext>>,
    query: Query<TenantQueryParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let _ = query.into_inner();
    Ok(HttpResponseOk(json!({"subnets": [{"id": "subnet-1"}]})))
}

/// Security group listing (count-oriented)
#[dropshot::endpoint {
    method = GET,
    path = "/neutron/v2.0/security-groups",
}]
async fn network_list_security_groups(
    rqctx: RequestContext<Arc<StubContext>>,
    query: Query<TenantQueryParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let _ = query.into_inner();
    Ok(HttpResponseOk(json!({"security_groups": [{"id": "sg-default"}]})))
}

/// Network quota set
#[dropshot::endpoint {
    method = GET,
    path = "/neutron/v2.0/quotas/{project_id}",
}]
async fn network_get_quotas(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<ProjectPathParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let _ = path.into_inner();
    Ok(HttpResponseOk(json!({
        "quota": {
            "floatingip": 5, "network": 3, "port": 50, "router": 2,
            "subnet": 3, "security_group": 10, "security_group_rule": 100,
        }
    })))
}

// ============================================================================
// Volume (Cinder)
// ============================================================================

#[derive(Deserialize, JsonSchema)]
struct CinderQuotaPathParam {
    project_id: String,
    target_id: String,
}

/// Volume detail listing
#[dropshot::endpoint {
    method = GET,
    path = "/cinder/v3/{project_id}/volumes/detail",
}]
async fn volume_list_volumes(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<ProjectPathParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let _ = path.into_inner();
    Ok(HttpResponseOk(json!({"volumes": [{"id": "vol-1", "size": 20}]})))
}

/// Snapshot detail listing
#[dropshot::endpoint {
    method = GET,
    path = "/cinder/v3/{project_id}/snapshots/detail",
}]
async fn volume_list_snapshots(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<ProjectPathParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let _ = path.into_inner();
    Ok(HttpResponseOk(json!({"snapshots": []})))
}

/// Volume quota set
#[dropshot::endpoint {
    method = GET,
    path = "/cinder/v3/{project_id}/os-quota-sets/{target_id}",
}]
async fn volume_get_quotas(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<CinderQuotaPathParam>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let target = path.into_inner().target_id;
    let state = ctx.state();
    let quota = state
        .cinder_quotas
        .get(&target)
        .cloned()
        .unwrap_or_else(|| json!({"volumes": 10, "snapshots": 10, "gigabytes": 100}));
    Ok(HttpResponseOk(json!({"quota_set": quota})))
}

/// Update a volume quota set
#[dropshot::endpoint {
    method = PUT,
    path = "/cinder/v3/{project_id}/os-quota-sets/{target_id}",
}]
async fn volume_update_quotas(
    rqctx: RequestContext<Arc<StubContext>>,
    path: Path<CinderQuotaPathParam>,
    body: TypedBody<Value>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    let target = path.into_inner().target_id;
    let quota = body.into_inner()["quota_set"].clone();
    ctx.state().cinder_quotas.insert(target, quota.clone());
    Ok(HttpResponseOk(json!({"quota_set": quota})))
}

// ============================================================================
// Image (Glance)
// ============================================================================

/// Image listing
#[dropshot::endpoint {
    method = GET,
    path = "/image/v2/images",
}]
async fn image_list_images(
    rqctx: RequestContext<Arc<StubContext>>,
) -> Result<HttpResponseOk<Value>, HttpError> {
    let ctx = rqctx.context();
    require_token(ctx, &rqctx)?;
    Ok(HttpResponseOk(json!({
        "images": [
            {"id": "img-ubuntu", "name": "ubuntu-24.04", "status": "active",
             "min_disk": 10, "min_ram": 512},
        ]
    })))
}

// ============================================================================
// API assembly
// ============================================================================

/// Build the stub's API description with every endpoint registered
pub fn api_description() -> anyhow::Result<ApiDescription<Arc<StubContext>>> {
    let mut api = ApiDescription::new();
    api.register(identity_issue_token)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(identity_create_project)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(identity_create_user)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(identity_grant_role)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(identity_delete_project)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(identity_delete_user)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(compute_create_server)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(compute_get_server)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(compute_list_flavors)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(compute_list_keypairs)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(compute_get_quotas)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(compute_update_quotas)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(compute_remote_console)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(network_list_fips)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(network_show_fip)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(network_list_pfs)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(network_create_pf)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(network_delete_pf)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(network_list_networks)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(network_list_ports)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(network_list_routers)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(network_list_subnets)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(network_list_security_groups)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(network_get_quotas)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(volume_list_volumes)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(volume_list_snapshots)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(volume_get_quotas)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(volume_update_quotas)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    api.register(image_list_images)
        .map_err(|e| anyhow::anyhow!("register: {}", e))?;
    Ok(api)
}
