//! # keyhub-auth
//!
//! Authentication for the two KeyHub identity domains.
//!
//! ## Modules
//!
//! - `jwt`: per-domain token signing and validation
//! - `password`: Argon2id hashing and the new-password policy
//! - `session`: the session guard used by every protected endpoint

pub mod jwt;
pub mod password;
pub mod session;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::{PasswordHasher, PasswordPolicy};
pub use session::{IssuedSession, Session, SessionGuard};
