//! # keyhub-database
//!
//! PostgreSQL connection management, repositories, and the [`KeyStore`]
//! interface the license lifecycle runs against.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{KeyStore, MemoryKeyStore, PgKeyStore};
