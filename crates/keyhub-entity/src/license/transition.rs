//! Conditional state transitions.
//!
//! The engine decides a transition from a snapshot of the key; the store
//! commits it only if the row still matches that snapshot. A mismatch
//! means another request won the race and the decision must be redone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keyhub_core::types::LicenseKeyId;

use super::model::LicenseKey;
use super::status::LicenseStatus;

/// The row state a transition was decided against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPrecondition {
    /// Exact status required, or `None` for any non-terminal status.
    pub status: Option<LicenseStatus>,
    /// Exact counter required, or `None` when only the ceiling matters.
    pub download_count: Option<i32>,
}

impl KeyPrecondition {
    /// The row must still look exactly like `key`.
    pub fn of(key: &LicenseKey) -> Self {
        Self {
            status: Some(key.status),
            download_count: Some(key.download_count),
        }
    }

    /// The row must still be usable. Concurrent downloads on the same key
    /// do not invalidate each other; the ceiling is checked on apply.
    pub fn live() -> Self {
        Self {
            status: None,
            download_count: None,
        }
    }

    pub fn holds_for(&self, key: &LicenseKey) -> bool {
        let status_holds = match self.status {
            Some(status) => key.status == status,
            None => !key.status.is_terminal(),
        };
        status_holds
            && self
                .download_count
                .is_none_or(|count| key.download_count == count)
    }
}

/// Column changes applied when the precondition holds.
///
/// `None` timestamps leave the stored value untouched. `activated_at` is
/// only ever written once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyUpdate {
    pub status: LicenseStatus,
    pub increment_downloads: bool,
    pub activated_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl KeyUpdate {
    /// An update that only sets the status.
    pub fn status(status: LicenseStatus) -> Self {
        Self {
            status,
            increment_downloads: false,
            activated_at: None,
            last_used_at: None,
            expires_at: None,
        }
    }

    /// Download counter delta as stored.
    pub fn download_delta(&self) -> i32 {
        i32::from(self.increment_downloads)
    }
}

/// A decided transition for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTransition {
    pub key_id: LicenseKeyId,
    pub expected: KeyPrecondition,
    pub update: KeyUpdate,
}

impl KeyTransition {
    pub fn new(key: &LicenseKey, update: KeyUpdate) -> Self {
        Self {
            key_id: key.id,
            expected: KeyPrecondition::of(key),
            update,
        }
    }

    /// A transition that only requires the key to still be usable.
    pub fn live(key: &LicenseKey, update: KeyUpdate) -> Self {
        Self {
            key_id: key.id,
            expected: KeyPrecondition::live(),
            update,
        }
    }

    /// Apply to an in-memory row.
    ///
    /// Returns the updated row, or `None` when the precondition no longer
    /// holds or the increment would push the counter past the ceiling.
    pub fn apply_to(&self, key: &LicenseKey) -> Option<LicenseKey> {
        if key.id != self.key_id || !self.expected.holds_for(key) {
            return None;
        }
        let next_count = key.download_count + self.update.download_delta();
        if key.max_downloads.is_some_and(|max| next_count > max) {
            return None;
        }
        let mut next = key.clone();
        next.status = self.update.status;
        next.download_count = next_count;
        if next.activated_at.is_none() {
            next.activated_at = self.update.activated_at;
        }
        if let Some(at) = self.update.last_used_at {
            next.last_used_at = Some(at);
        }
        if let Some(at) = self.update.expires_at {
            next.expires_at = Some(at);
        }
        Some(next)
    }
}
