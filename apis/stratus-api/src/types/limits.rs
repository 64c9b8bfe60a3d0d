// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Quota/usage summary types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One quota with its current consumption
///
/// A limit of -1 means unlimited (or unknown), matching the providers'
/// own convention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct QuotaUsage {
    pub in_use: i64,
    pub limit: i64,
}

/// Aggregated quota/usage report across the compute, volume, and network
/// providers, keyed by resource name.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LimitSummary {
    pub quotas: BTreeMap<String, QuotaUsage>,
}
