//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keyhub_core::types::{AccountId, DownloadLogId, LicenseKeyId};
use keyhub_entity::account::AccountDomain;
use keyhub_entity::license::{LicenseKey, LicenseStatus};
use keyhub_service::Remaining;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Liveness check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Readiness report with dependency checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub key_store: String,
    pub database: String,
}

/// Key as shown in the admin console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseKeyResponse {
    pub id: LicenseKeyId,
    pub code: String,
    pub status: LicenseStatus,
    pub max_downloads: Option<i32>,
    pub download_count: i32,
    /// `None` when the key has no download ceiling.
    pub remaining_downloads: Option<u32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_company: Option<String>,
    pub created_by: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<LicenseKey> for LicenseKeyResponse {
    fn from(key: LicenseKey) -> Self {
        Self {
            remaining_downloads: Remaining::of(&key).as_option(),
            id: key.id,
            code: key.code,
            status: key.status,
            max_downloads: key.max_downloads,
            download_count: key.download_count,
            expires_at: key.expires_at,
            customer_name: key.customer_name,
            customer_email: key.customer_email,
            customer_company: key.customer_company,
            created_by: key.created_by,
            created_at: key.created_at,
            activated_at: key.activated_at,
            last_used_at: key.last_used_at,
        }
    }
}

/// Outcome of a batch issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueKeysResponse {
    pub requested: u32,
    pub failed: u32,
    pub keys: Vec<LicenseKeyResponse>,
}

/// Public view of a usable key. Customer details are not exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyValidityResponse {
    pub valid: bool,
    pub status: LicenseStatus,
    pub remaining_downloads: Option<u32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A granted download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub download_url: String,
    /// `None` when unlimited or for unlicensed downloads.
    pub remaining_downloads: Option<u32>,
    /// `None` if the log entry could not be written.
    pub log_id: Option<DownloadLogId>,
}

/// A freshly opened session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account: AccountResponse,
}

/// Account summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: AccountId,
    pub email: String,
    pub display_name: Option<String>,
    pub domain: AccountDomain,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Identity behind the presented session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub account_id: AccountId,
    pub email: String,
    pub domain: AccountDomain,
    pub expires_at: DateTime<Utc>,
}
