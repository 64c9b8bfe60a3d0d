// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Gateway error taxonomy
//!
//! Every provider-call failure is translated into this taxonomy at the
//! component boundary; raw transport errors never reach callers. The
//! single `into_http` mapping keeps status codes consistent across
//! handlers.

use dropshot::{ClientErrorStatusCode, HttpError};
use thiserror::Error;

/// Errors surfaced by gateway components
#[derive(Error, Debug)]
pub enum GatewayError {
    /// A required setting is missing. Fatal for the operation; never
    /// retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The per-project port-forwarding cap is reached. The caller must
    /// free capacity; retrying without doing so cannot succeed.
    #[error("port forwarding limit reached ({used} of {limit} in use)")]
    AdmissionDenied { used: usize, limit: u32 },

    /// The shared floating-IP pool has no free address
    #[error("no free floating IP available in the shared pool")]
    ResourceExhausted,

    /// Upstream rejected a duplicate (floating IP, external port,
    /// protocol) tuple; pick a different port or omit it
    #[error("port forwarding conflict: {0}")]
    Conflict(String),

    /// Referenced object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Session or provider token expired or invalid
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A provider call failed; no side effect occurred and the caller
    /// may retry
    #[error("upstream service failure: {0}")]
    Upstream(String),

    /// The instance never published a fixed address within the bounded
    /// poll window. The instance is left as-is.
    #[error("timed out waiting for the instance network address")]
    NetworkingTimeout,
}

impl GatewayError {
    /// Translate into the HTTP error surfaced to API callers
    pub fn into_http(self) -> HttpError {
        let message = self.to_string();
        match self {
            GatewayError::Configuration(_) => HttpError::for_internal_error(message),
            GatewayError::AdmissionDenied { .. } => HttpError::for_bad_request(None, message),
            GatewayError::ResourceExhausted => HttpError::for_unavail(None, message),
            GatewayError::Conflict(_) => {
                HttpError::for_client_error(None, ClientErrorStatusCode::CONFLICT, message)
            }
            GatewayError::NotFound(_) => HttpError::for_not_found(None, message),
            GatewayError::Authentication(_) => {
                HttpError::for_client_error(None, ClientErrorStatusCode::UNAUTHORIZED, message)
            }
            GatewayError::Upstream(_) => HttpError::for_internal_error(message),
            GatewayError::NetworkingTimeout => HttpError::for_internal_error(message),
        }
    }
}

impl From<neutron_client::NeutronError> for GatewayError {
    fn from(e: neutron_client::NeutronError) -> Self {
        use neutron_client::NeutronError;
        match e {
            NeutronError::Auth(m) => GatewayError::Authentication(m),
            NeutronError::NotFound(m) => GatewayError::NotFound(m),
            NeutronError::Conflict(m) => GatewayError::Conflict(m),
            NeutronError::Api { status, message } => {
                GatewayError::Upstream(format!("network service ({}): {}", status, message))
            }
            NeutronError::Transport(e) => {
                GatewayError::Upstream(format!("network service: {}", e))
            }
        }
    }
}

impl From<nova_client::NovaError> for GatewayError {
    fn from(e: nova_client::NovaError) -> Self {
        use nova_client::NovaError;
        match e {
            NovaError::Auth(m) => GatewayError::Authentication(m),
            NovaError::NotFound(m) => GatewayError::NotFound(m),
            NovaError::Api { status, message } => {
                GatewayError::Upstream(format!("compute service ({}): {}", status, message))
            }
            NovaError::Transport(e) => GatewayError::Upstream(format!("compute service: {}", e)),
        }
    }
}

impl From<keystone_client::KeystoneError> for GatewayError {
    fn from(e: keystone_client::KeystoneError) -> Self {
        use keystone_client::KeystoneError;
        match e {
            KeystoneError::Auth(m) => GatewayError::Authentication(m),
            KeystoneError::NotFound(m) => GatewayError::NotFound(m),
            KeystoneError::Conflict(m) => GatewayError::Conflict(m),
            KeystoneError::Api { status, message } => {
                GatewayError::Upstream(format!("identity service ({}): {}", status, message))
            }
            KeystoneError::Transport(e) => {
                GatewayError::Upstream(format!("identity service: {}", e))
            }
            KeystoneError::Malformed(m) => {
                GatewayError::Upstream(format!("identity service: {}", m))
            }
        }
    }
}

impl From<cinder_client::CinderError> for GatewayError {
    fn from(e: cinder_client::CinderError) -> Self {
        use cinder_client::CinderError;
        match e {
            CinderError::Auth(m) => GatewayError::Authentication(m),
            CinderError::NotFound(m) => GatewayError::NotFound(m),
            CinderError::Api { status, message } => {
                GatewayError::Upstream(format!("volume service ({}): {}", status, message))
            }
            CinderError::Transport(e) => GatewayError::Upstream(format!("volume service: {}", e)),
        }
    }
}

impl From<glance_client::GlanceError> for GatewayError {
    fn from(e: glance_client::GlanceError) -> Self {
        use glance_client::GlanceError;
        match e {
            GlanceError::Auth(m) => GatewayError::Authentication(m),
            GlanceError::Api { status, message } => {
                GatewayError::Upstream(format!("image service ({}): {}", status, message))
            }
            GlanceError::Transport(e) => GatewayError::Upstream(format!("image service: {}", e)),
        }
    }
}

impl From<stratus_auth_session::SessionError> for GatewayError {
    fn from(e: stratus_auth_session::SessionError) -> Self {
        GatewayError::Authentication(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn http_status_mapping() {
        let cases = [
            (GatewayError::Configuration("x".into()), 500),
            (GatewayError::AdmissionDenied { used: 10, limit: 10 }, 400),
            (GatewayError::ResourceExhausted, 503),
            (GatewayError::Conflict("dup".into()), 409),
            (GatewayError::NotFound("gone".into()), 404),
            (GatewayError::Authentication("expired".into()), 401),
            (GatewayError::Upstream("boom".into()), 500),
            (GatewayError::NetworkingTimeout, 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_http().status_code.as_u16(), status);
        }
    }

    #[test]
    fn neutron_conflict_translates() {
        let err: GatewayError =
            neutron_client::NeutronError::Conflict("duplicate".to_string()).into();
        assert!(matches!(err, GatewayError::Conflict(_)));
    }

    #[test]
    fn admission_denied_names_the_numbers() {
        let err = GatewayError::AdmissionDenied { used: 10, limit: 10 };
        assert_eq!(
            err.to_string(),
            "port forwarding limit reached (10 of 10 in use)"
        );
    }
}
