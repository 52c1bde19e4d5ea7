//! Administrator and technician accounts.

pub mod domain;
pub mod model;

pub use domain::AccountDomain;
pub use model::{Account, CreateAccount};
