//! Storage interface for the license key lifecycle.
//!
//! The lifecycle logic only needs to find a key, commit a decided
//! transition if the row is unchanged, and append to the download log.
//! Everything else here serves the admin console.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use keyhub_core::result::AppResult;
use keyhub_core::types::{LicenseKeyId, PageRequest, PageResponse};
use keyhub_core::AppError;
use keyhub_entity::download::{CreateDownloadLogEntry, DownloadLogEntry};
use keyhub_entity::license::{CreateLicenseKey, KeyTransition, LicenseKey, LicenseStatus};

pub use self::memory::MemoryKeyStore;
pub use self::pg::PgKeyStore;

/// Result of inserting a freshly generated key.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted(LicenseKey),
    /// Another key already holds this code. The caller should generate a
    /// new one.
    CodeTaken,
}

/// What happened to the log entry written alongside a transition.
#[derive(Debug)]
pub enum LogWrite {
    NotRequested,
    Written(DownloadLogEntry),
    /// The entry could not be stored. The transition itself stays committed.
    Failed(AppError),
}

/// A committed conditional update.
#[derive(Debug)]
pub struct AppliedTransition {
    pub key: LicenseKey,
    pub log: LogWrite,
}

/// Filter for the admin key listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyFilter {
    pub status: Option<LicenseStatus>,
    /// Case-insensitive substring of code, customer email or customer name.
    pub search: Option<String>,
}

impl KeyFilter {
    pub(crate) fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")))
    }

    pub(crate) fn matches(&self, key: &LicenseKey) -> bool {
        if self.status.is_some_and(|status| key.status != status) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [
                    Some(key.code.as_str()),
                    key.customer_email.as_deref(),
                    key.customer_name.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Filter for the download log listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadLogFilter {
    pub license_key_id: Option<LicenseKeyId>,
    pub success: Option<bool>,
}

impl DownloadLogFilter {
    pub(crate) fn matches(&self, entry: &DownloadLogEntry) -> bool {
        self.license_key_id
            .is_none_or(|id| entry.license_key_id == Some(id))
            && self.success.is_none_or(|success| entry.success == success)
    }
}

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStats {
    pub total: u64,
    pub unused: u64,
    pub active: u64,
    pub revoked: u64,
    pub expired: u64,
    pub total_downloads: u64,
}

impl KeyStats {
    pub(crate) fn record(&mut self, status: LicenseStatus, count: u64) {
        self.total += count;
        match status {
            LicenseStatus::Unused => self.unused += count,
            LicenseStatus::Active => self.active += count,
            LicenseStatus::Revoked => self.revoked += count,
            LicenseStatus::Expired => self.expired += count,
        }
    }
}

/// Persistence for license keys and download logs.
///
/// `apply_if` is the only write path for lifecycle transitions. It must
/// commit the update and the optional log entry atomically with respect to
/// other transitions on the same key, and must refuse the update when the
/// row no longer matches the transition's precondition or the increment
/// would exceed the download ceiling.
#[async_trait]
pub trait KeyStore: Send + Sync + 'static {
    async fn find_by_code(&self, code: &str) -> AppResult<Option<LicenseKey>>;

    async fn find_by_id(&self, id: LicenseKeyId) -> AppResult<Option<LicenseKey>>;

    /// Insert a new `unused` key. Reports a code collision instead of failing.
    async fn insert(&self, key: CreateLicenseKey) -> AppResult<InsertOutcome>;

    /// Commit `transition` if its precondition still holds.
    ///
    /// Returns `None` when a concurrent writer changed the row first.
    async fn apply_if(
        &self,
        transition: &KeyTransition,
        log: Option<CreateDownloadLogEntry>,
    ) -> AppResult<Option<AppliedTransition>>;

    async fn append_log(&self, entry: CreateDownloadLogEntry) -> AppResult<DownloadLogEntry>;

    /// Physically remove a key. Its log entries are kept with the key
    /// reference cleared. Returns `false` if the key did not exist.
    async fn delete(&self, id: LicenseKeyId) -> AppResult<bool>;

    async fn list(&self, filter: &KeyFilter, page: PageRequest)
    -> AppResult<PageResponse<LicenseKey>>;

    async fn stats(&self) -> AppResult<KeyStats>;

    async fn list_logs(
        &self,
        filter: &DownloadLogFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<DownloadLogEntry>>;
}
