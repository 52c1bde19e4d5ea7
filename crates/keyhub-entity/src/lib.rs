//! # keyhub-entity
//!
//! Domain entities for KeyHub. Structs here are either database rows
//! (deriving `sqlx::FromRow`) or value objects passed between the engine
//! and the store.

pub mod account;
pub mod download;
pub mod license;
