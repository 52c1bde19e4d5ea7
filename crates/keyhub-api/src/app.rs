//! Application builder: wires router, middleware and state into an Axum app.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use keyhub_core::config::{AppConfig, ServerConfig, StoreBackend};
use keyhub_core::error::AppError;
use keyhub_database::{DatabasePool, KeyStore, MemoryKeyStore, PgKeyStore};

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let server: ServerConfig = state.config.server.clone();
    build_router(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds.max(1),
        )))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&server.cors))
        .layer(TraceLayer::new_for_http())
}

/// The key store selected by configuration.
pub fn key_store(backend: StoreBackend, db: &DatabasePool) -> Arc<dyn KeyStore> {
    match backend {
        StoreBackend::Postgres => Arc::new(PgKeyStore::new(db.pool().clone())),
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory key store; keys are lost on restart");
            Arc::new(MemoryKeyStore::new())
        }
    }
}

/// Runs the KeyHub server until Ctrl+C.
pub async fn run_server(config: AppConfig, db: DatabasePool) -> Result<(), AppError> {
    let store = key_store(config.license.store, &db);
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app = build_app(AppState::new(config, db.clone(), store));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(%addr, "KeyHub server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    db.close().await;
    tracing::info!("KeyHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
