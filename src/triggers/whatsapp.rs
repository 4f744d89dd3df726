//! WhatsApp Cloud API webhook: registration handshake and status callbacks.

use axum::{
    body::Body,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use crate::delivery::WhatsAppCloudAdapter;
use crate::metrics::WebhookMetrics;
use crate::server::AppState;

use super::{read_payload, WebhookAck};

const PROVIDER: &str = "whatsapp";

/// Query parameters of the subscription handshake
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

impl VerifyParams {
    /// The challenge to echo back, if mode and token check out.
    pub fn accept(&self, expected_token: Option<&str>) -> Option<&str> {
        let expected = expected_token?;
        if self.mode.as_deref() != Some("subscribe") {
            return None;
        }
        if self.verify_token.as_deref() != Some(expected) {
            return None;
        }
        Some(self.challenge.as_deref().unwrap_or_default())
    }
}

/// GET /webhooks/whatsapp - subscription handshake
#[tracing::instrument(name = "webhook.whatsapp.verify", skip(state, params))]
pub async fn whatsapp_verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let expected = state.settings.webhooks.whatsapp_verify_token.as_deref();

    match params.accept(expected) {
        Some(challenge) => {
            WebhookMetrics::record_verified(PROVIDER);
            tracing::info!("WhatsApp webhook verified");
            (StatusCode::OK, challenge.to_string()).into_response()
        }
        None => {
            WebhookMetrics::record_unauthorized(PROVIDER);
            if expected.is_none() {
                tracing::warn!("WhatsApp verify token not configured, rejecting handshake");
            } else {
                tracing::warn!(mode = ?params.mode, "WhatsApp webhook verification failed");
            }
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// POST /webhooks/whatsapp - delivery status callbacks
#[tracing::instrument(name = "webhook.whatsapp", skip(state, body))]
pub async fn whatsapp_webhook(State(state): State<AppState>, body: Body) -> WebhookAck {
    let received_at = Utc::now();

    let Some(payload) = read_payload(PROVIDER, body).await else {
        return WebhookAck::processed(0);
    };

    let outcome = state
        .reconciler
        .reconcile(&WhatsAppCloudAdapter, &payload, received_at)
        .await;

    WebhookMetrics::record_accepted(PROVIDER);
    tracing::debug!(
        found = outcome.found,
        processed = outcome.processed,
        applied = outcome.applied,
        errors = outcome.errors,
        "WhatsApp callback reconciled"
    );

    WebhookAck::processed(outcome.processed)
}
