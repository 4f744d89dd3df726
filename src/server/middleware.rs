use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::metrics::WebhookMetrics;

/// Header carrying the Evolution gateway shared secret
pub const EVOLUTION_API_KEY_HEADER: &str = "apikey";

/// API Key authentication middleware for the admin API.
/// Validates X-API-Key header against configured api.key
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    // If no API key is configured, allow all requests (development mode)
    let Some(expected_key) = &state.settings.api.key else {
        return Ok(next.run(req).await);
    };

    let api_key = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());

    match api_key {
        Some(key) if key == expected_key => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing API key header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Shared-secret check for Evolution callbacks.
///
/// Runs before the body is read, so a rejected request never reaches the
/// reconciler. Unlike the admin key, an unset secret rejects everything.
pub async fn evolution_api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected_key) = state.settings.webhooks.evolution_api_key.as_deref() else {
        WebhookMetrics::record_unauthorized("evolution");
        tracing::warn!("Evolution API key not configured, rejecting callback");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let api_key = req
        .headers()
        .get(EVOLUTION_API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match api_key {
        Some(key) if key == expected_key => Ok(next.run(req).await),
        Some(_) => {
            WebhookMetrics::record_unauthorized("evolution");
            tracing::warn!("Invalid Evolution API key provided");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            WebhookMetrics::record_unauthorized("evolution");
            tracing::warn!("Missing Evolution apikey header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
