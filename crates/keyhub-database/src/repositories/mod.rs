//! Repository implementations for KeyHub tables.

pub mod account;
pub mod download_log;
pub mod license_key;

pub use account::AccountRepository;
pub use download_log::DownloadLogRepository;
pub use license_key::LicenseKeyRepository;
