use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};

use super::health::health;
use super::metrics::prometheus_metrics;
use super::template::{
    create_template, delete_template, get_template, list_templates, preview_template,
    render_template, update_template,
};

pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        // Template administration
        .nest(
            "/api/v1",
            Router::new()
                .route("/templates", get(list_templates).post(create_template))
                .route("/templates/preview", post(preview_template))
                .route(
                    "/templates/{id}",
                    get(get_template)
                        .put(update_template)
                        .delete(delete_template),
                )
                .route("/render", post(render_template))
                .route_layer(middleware::from_fn_with_state(state.clone(), api_key_auth)),
        )
}
