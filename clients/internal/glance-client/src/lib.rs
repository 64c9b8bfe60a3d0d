// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Glance (image service) client
//!
//! Listing only; the gateway never mutates images.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the Glance client
#[derive(Error, Debug)]
pub enum GlanceError {
    #[error("image service rejected credentials: {0}")]
    Auth(String),

    #[error("image service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("image service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Image as reported by Glance
#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub min_disk: u64,
    #[serde(default)]
    pub min_ram: u64,
}

#[derive(Deserialize)]
struct ImageList {
    images: Vec<Image>,
}

/// Glance API client
#[derive(Clone)]
pub struct GlanceClient {
    base_url: String,
    client: reqwest::Client,
}

impl GlanceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GlanceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// List images visible to the caller
    pub async fn list_images(&self, token: &str) -> Result<Vec<Image>, GlanceError> {
        let resp = self
            .client
            .get(format!("{}/v2/images", self.base_url))
            .header("X-Auth-Token", token)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => GlanceError::Auth(message),
                s => GlanceError::Api { status: s, message },
            });
        }
        Ok(resp.json::<ImageList>().await?.images)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn lists_images() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "images": [
                    {"id": "img-1", "name": "ubuntu-24.04", "status": "active",
                     "min_disk": 10, "min_ram": 512},
                ]
            })))
            .mount(&mock)
            .await;

        let client = GlanceClient::new(&mock.uri(), Duration::from_secs(5)).unwrap();
        let images = client.list_images("tok").await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].name.as_deref(), Some("ubuntu-24.04"));
    }
}
