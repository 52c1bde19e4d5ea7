//! # keyhub-api
//!
//! HTTP API layer for KeyHub built on Axum.
//!
//! Provides the public key validation and download endpoints, the admin
//! key console, technician downloads, session extractors for both identity
//! domains, and the mapping from application errors to HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::{ApiError, ApiResult};
pub use state::AppState;
