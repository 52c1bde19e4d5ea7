//! Admin console handlers. Every route here requires an admin session.

pub mod downloads;
pub mod keys;
