//! Inbound provider callbacks.
//!
//! Both endpoints acknowledge every routed, authenticated request with
//! `200 {"ok":true,"processed":N}`, including malformed bodies and store
//! failures. A non-2xx answer would make the provider retry the same
//! callback indefinitely. Only authentication (401/403) and method (405)
//! failures are reported as errors.

mod evolution;
mod whatsapp;

use axum::{body::Body, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

pub use evolution::evolution_webhook;
pub use whatsapp::{whatsapp_verify, whatsapp_webhook, VerifyParams};

/// Largest callback body that is read and reconciled
pub const MAX_WEBHOOK_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Acknowledgement body returned to providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub ok: bool,
    pub processed: usize,
}

impl WebhookAck {
    pub fn processed(processed: usize) -> Self {
        Self {
            ok: true,
            processed,
        }
    }
}

impl IntoResponse for WebhookAck {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Read and parse a callback body. Oversized, unreadable and malformed
/// bodies are logged and yield `None`.
async fn read_payload(provider: &'static str, body: Body) -> Option<serde_json::Value> {
    let bytes = match axum::body::to_bytes(body, MAX_WEBHOOK_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            crate::metrics::WebhookMetrics::record_oversized(provider);
            tracing::warn!(
                provider = provider,
                limit = MAX_WEBHOOK_BODY_BYTES,
                error = %e,
                "Webhook body too large or unreadable, acknowledged without processing"
            );
            return None;
        }
    };

    parse_body(provider, &bytes)
}

/// Parse a callback body, logging instead of failing on bad JSON.
fn parse_body(provider: &'static str, body: &[u8]) -> Option<serde_json::Value> {
    match serde_json::from_slice(body) {
        Ok(value) => Some(value),
        Err(e) => {
            crate::metrics::WebhookMetrics::record_malformed(provider);
            tracing::warn!(
                provider = provider,
                error = %e,
                body_len = body.len(),
                "Malformed webhook body acknowledged without processing"
            );
            None
        }
    }
}
