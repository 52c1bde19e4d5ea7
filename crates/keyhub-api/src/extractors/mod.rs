//! Custom Axum extractors.

pub mod client;
pub mod pagination;
pub mod path;
pub mod session;

pub use client::ClientInfo;
pub use pagination::PaginationParams;
pub use path::parse_key_id;
pub use session::{AdminSession, TechnicianSession};
