// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Admission control for port-forwarding creation
//!
//! Enforces the per-project cap before every rule creation. Usage is a
//! derived aggregate (enumerate floating IPs, sum rule counts), which
//! makes naive check-then-act racy: two requests can both observe
//! `usage = limit - 1` and both proceed. With `serialize_admission` on
//! (the default) a per-project async mutex is held from the check until
//! the permit is dropped after rule creation, which closes that window.
//! Off restores the optimistic behavior: the cap can be exceeded by at
//! most one rule per extra in-flight request, which some deployments
//! accept in exchange for uncontended checks.

use crate::errors::GatewayError;
use crate::rules::RuleStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;

/// Proof that admission was granted.
///
/// Consumed by the immediately following `create_rule` call: keep the
/// permit alive until the creation completes, then drop it. When
/// admission is serialized the permit holds the project's lock, so
/// dropping it early reopens the race the lock exists to close.
pub struct AdmissionPermit {
    /// Usage observed at check time
    pub usage: usize,
    _guard: Option<OwnedMutexGuard<()>>,
}

/// Per-project admission controller
#[derive(Clone)]
pub struct AdmissionController {
    rules: RuleStore,
    limit: u32,
    serialize: bool,
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl AdmissionController {
    pub fn new(rules: RuleStore, limit: u32, serialize: bool) -> Self {
        Self {
            rules,
            limit,
            serialize,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check current usage against the cap and reserve the right to
    /// create one rule.
    ///
    /// Usage is recomputed from upstream on every call. Denials surface
    /// as a client error and are never retried automatically; the
    /// caller must free capacity first.
    pub async fn check_and_reserve(
        &self,
        token: &str,
        project_id: &str,
    ) -> Result<AdmissionPermit, GatewayError> {
        let guard = if self.serialize {
            let lock = self.project_lock(project_id);
            Some(lock.lock_owned().await)
        } else {
            None
        };

        let usage = self.rules.project_usage(token, project_id).await?;
        if usage >= self.limit as usize {
            crate::metrics::ADMISSION_DENIED.inc();
            tracing::info!(project_id, usage, limit = self.limit, "admission denied");
            return Err(GatewayError::AdmissionDenied {
                used: usage,
                limit: self.limit,
            });
        }

        Ok(AdmissionPermit {
            usage,
            _guard: guard,
        })
    }

    fn project_lock(&self, project_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = lock_map(&self.locks);
        locks
            .entry(project_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

// The lock map is never poisoned: nothing panics while holding it.
fn lock_map<'a>(
    locks: &'a Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
) -> MutexGuard<'a, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
    match locks.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
