//! Session guard.

pub mod guard;

pub use guard::{IssuedSession, Session, SessionGuard};
