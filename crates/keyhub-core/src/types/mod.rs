//! Shared value types.

pub mod id;
pub mod pagination;

pub use self::id::{AccountId, DownloadLogId, LicenseKeyId};
pub use self::pagination::{PageRequest, PageResponse};
