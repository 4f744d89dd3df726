//! Health check endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: StoreHealthResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresHealthResponse>,
    pub templates: usize,
}

#[derive(Debug, Serialize)]
pub struct StoreHealthResponse {
    pub backend: String,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostgresHealthResponse {
    pub pool_size: u32,
    pub idle_connections: u32,
}

/// GET /health - 200 when the record store answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let uptime_seconds = state.start_time.elapsed().as_secs();

    let store = match state.record_store.health_check().await {
        Ok(()) => StoreHealthResponse {
            backend: state.record_store.backend_name().to_string(),
            reachable: true,
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Record store health check failed");
            StoreHealthResponse {
                backend: state.record_store.backend_name().to_string(),
                reachable: false,
                error: Some(e.to_string()),
            }
        }
    };

    let postgres = state.postgres_pool.as_ref().map(|pool| {
        let inner_pool = pool.pool();
        PostgresHealthResponse {
            pool_size: inner_pool.size(),
            idle_connections: inner_pool.num_idle() as u32,
        }
    });

    let (code, status) = if store.reachable {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds,
            store,
            postgres,
            templates: state.template_store.count(),
        }),
    )
}
