use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as CorsAny, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::api::api_routes;
use crate::triggers::{evolution_webhook, whatsapp_verify, whatsapp_webhook, WebhookAck};

use super::{evolution_api_key_auth, AppState};

/// Largest request body accepted on the admin API
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.server.cors_origins);

    Router::new()
        .merge(webhook_routes(&state))
        .merge(api_routes(&state).layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn webhook_routes(state: &AppState) -> Router<AppState> {
    // route_layer keeps the 405 for unsupported methods ahead of the key check
    let evolution = Router::new()
        .route("/webhooks/evolution", post(evolution_webhook))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            evolution_api_key_auth,
        ));

    Router::new()
        .route(
            "/webhooks/whatsapp",
            get(whatsapp_verify).post(whatsapp_webhook),
        )
        .merge(evolution)
        // Handlers cap the body themselves and acknowledge anything larger
        .layer(DefaultBodyLimit::disable())
        .layer(CatchPanicLayer::custom(webhook_panic_response))
}

/// Providers still get an acknowledgement when a handler panics.
fn webhook_panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    tracing::error!(panic = %detail, "Webhook handler panicked, acknowledging callback");
    WebhookAck::processed(0).into_response()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(CorsAny).allow_headers(CorsAny);

    if origins.is_empty() {
        return base.allow_origin(CorsAny);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
}
