//! License key entities.

pub mod code;
pub mod model;
pub mod status;
pub mod transition;

pub use code::CodeFormat;
pub use model::{CreateLicenseKey, LicenseKey};
pub use status::LicenseStatus;
pub use transition::{KeyPrecondition, KeyTransition, KeyUpdate};
