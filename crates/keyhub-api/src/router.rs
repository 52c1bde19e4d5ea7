//! Route definitions for the KeyHub HTTP API.
//!
//! All routes are mounted under `/api`, grouped by audience: public key
//! endpoints, the admin console, and the technician portal.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with every route and the request-level middleware.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes;

    let api_routes = Router::new()
        .merge(health_routes())
        .merge(public_routes())
        .merge(admin_routes())
        .merge(technician_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Liveness and readiness (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}

/// Key validation and licensed downloads (no auth required)
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/licenses/validate", post(handlers::public::validate_key))
        .route("/downloads", post(handlers::public::licensed_download))
}

/// Admin console
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/auth/login", post(handlers::auth::admin_login))
        .route("/admin/auth/logout", post(handlers::auth::admin_logout))
        .route("/admin/auth/me", get(handlers::auth::admin_me))
        .route(
            "/admin/keys",
            get(handlers::admin::keys::list_keys).post(handlers::admin::keys::issue_keys),
        )
        .route("/admin/keys/stats", get(handlers::admin::keys::key_stats))
        .route("/admin/keys/bulk", post(handlers::admin::keys::bulk_keys))
        .route(
            "/admin/keys/{id}",
            get(handlers::admin::keys::get_key).delete(handlers::admin::keys::delete_key),
        )
        .route(
            "/admin/keys/{id}/revoke",
            post(handlers::admin::keys::revoke_key),
        )
        .route(
            "/admin/keys/{id}/extend",
            post(handlers::admin::keys::extend_key),
        )
        .route(
            "/admin/downloads",
            get(handlers::admin::downloads::list_downloads),
        )
}

/// Technician portal
fn technician_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/technician/auth/login",
            post(handlers::auth::technician_login),
        )
        .route(
            "/technician/auth/logout",
            post(handlers::auth::technician_logout),
        )
        .route("/technician/auth/me", get(handlers::auth::technician_me))
        .route(
            "/technician/downloads",
            post(handlers::technician::technician_download),
        )
}
