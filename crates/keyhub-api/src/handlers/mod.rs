//! Route handlers organized by audience.

pub mod admin;
pub mod auth;
pub mod health;
pub mod public;
pub mod technician;
