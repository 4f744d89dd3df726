use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;

use desk_notification_service::config::Settings;
use desk_notification_service::delivery::create_record_store;
use desk_notification_service::postgres::PostgresPool;
use desk_notification_service::server::{create_app, AppState};
use desk_notification_service::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing; keep the guard until shutdown
    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!("Configuration loaded");

    // Connect to PostgreSQL only when the record store needs it
    let postgres_pool = match (&settings.database, settings.store.backend.as_str()) {
        (Some(database), "postgres") => {
            let pool = PostgresPool::new(database).await?;
            tracing::info!(database = %pool.database_url_masked(), "PostgreSQL connected");
            Some(pool)
        }
        (None, "postgres") => {
            tracing::warn!("store.backend is postgres but no database section is configured");
            None
        }
        _ => None,
    };

    let record_store = create_record_store(&settings.store, postgres_pool.as_ref());

    if settings.webhooks.whatsapp_verify_token.is_none() {
        tracing::warn!("webhooks.whatsapp_verify_token not set, WhatsApp handshakes will be rejected");
    }
    if settings.webhooks.evolution_api_key.is_none() {
        tracing::warn!("webhooks.evolution_api_key not set, Evolution callbacks will be rejected");
    }

    // Create application state
    let state = AppState::new(settings.clone(), record_store, postgres_pool.clone());
    tracing::info!("Application state initialized");

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler())
        .await?;

    if let Some(pool) = postgres_pool {
        pool.close().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
