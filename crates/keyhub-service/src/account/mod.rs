//! Administrator and technician accounts.

pub mod service;

pub use service::{AccountService, LoginResult};
