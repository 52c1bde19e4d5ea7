//! Download log entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use keyhub_core::types::{AccountId, DownloadLogId, LicenseKeyId};

/// An append-only record of one download attempt.
///
/// Rows are never updated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DownloadLogEntry {
    pub id: DownloadLogId,
    /// Key used for the attempt. `None` for downloads that are not
    /// license-gated, such as technician portal downloads.
    pub license_key_id: Option<LicenseKeyId>,
    /// Technician account for portal downloads.
    pub technician_id: Option<AccountId>,
    pub platform: String,
    pub product_version: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    /// Machine-readable reason for a failed attempt (e.g. `QUOTA_EXCEEDED`).
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data required to append a download log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDownloadLogEntry {
    pub license_key_id: Option<LicenseKeyId>,
    pub technician_id: Option<AccountId>,
    pub platform: String,
    pub product_version: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub failure_reason: Option<String>,
}

impl CreateDownloadLogEntry {
    pub fn into_entry(self, id: DownloadLogId, now: DateTime<Utc>) -> DownloadLogEntry {
        DownloadLogEntry {
            id,
            license_key_id: self.license_key_id,
            technician_id: self.technician_id,
            platform: self.platform,
            product_version: self.product_version,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            success: self.success,
            failure_reason: self.failure_reason,
            created_at: now,
        }
    }
}
