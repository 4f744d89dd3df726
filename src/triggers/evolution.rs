//! Evolution gateway webhook. Authentication happens in
//! [`evolution_api_key_auth`](crate::server::evolution_api_key_auth).

use axum::{body::Body, extract::State};
use chrono::Utc;

use crate::delivery::EvolutionAdapter;
use crate::metrics::WebhookMetrics;
use crate::server::AppState;

use super::{read_payload, WebhookAck};

const PROVIDER: &str = "evolution";

/// POST /webhooks/evolution - delivery status callbacks
#[tracing::instrument(name = "webhook.evolution", skip(state, body))]
pub async fn evolution_webhook(State(state): State<AppState>, body: Body) -> WebhookAck {
    let received_at = Utc::now();

    let Some(payload) = read_payload(PROVIDER, body).await else {
        return WebhookAck::processed(0);
    };

    let outcome = state
        .reconciler
        .reconcile(&EvolutionAdapter, &payload, received_at)
        .await;

    WebhookMetrics::record_accepted(PROVIDER);
    tracing::debug!(
        event = ?payload.get("event"),
        found = outcome.found,
        processed = outcome.processed,
        applied = outcome.applied,
        errors = outcome.errors,
        "Evolution callback reconciled"
    );

    WebhookAck::processed(outcome.processed)
}
