//! Health check handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use keyhub_core::config::StoreBackend;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/health/detailed
///
/// Answers 503 when the database behind the key store does not respond.
pub async fn health_detailed(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<DetailedHealthResponse>>) {
    let (key_store, database_required) = match state.config.license.store {
        StoreBackend::Postgres => ("postgres", true),
        StoreBackend::Memory => ("memory", false),
    };

    let database = if database_required {
        match state.db.health_check().await {
            Ok(true) => "connected",
            Ok(false) => "degraded",
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                "unavailable"
            }
        }
    } else {
        "not_required"
    };

    let healthy = matches!(database, "connected" | "not_required");
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = DetailedHealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        key_store: key_store.to_string(),
        database: database.to_string(),
    };
    (status, Json(ApiResponse::ok(body)))
}
