// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Thin listing types (flavors, images, keypairs, networks)

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Compute flavor
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    pub vcpus: u32,
    /// RAM in MB
    pub ram: u64,
    /// Root disk in GB
    pub disk: u64,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FlavorListResponse {
    pub flavors: Vec<Flavor>,
}

/// Bootable image
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub status: String,
    /// Minimum root disk in GB
    pub min_disk: u64,
    /// Minimum RAM in MB
    pub min_ram: u64,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ImageListResponse {
    pub images: Vec<Image>,
}

/// SSH keypair registered with the compute provider
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Keypair {
    pub name: String,
    pub fingerprint: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct KeypairListResponse {
    pub keypairs: Vec<Keypair>,
}

/// Network visible to the project
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NetworkInfo {
    pub id: String,
    pub name: String,
    pub status: String,
    pub shared: bool,
    #[serde(default)]
    pub subnet_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NetworkListResponse {
    pub networks: Vec<NetworkInfo>,
}
