//! License key entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use keyhub_core::types::{AccountId, LicenseKeyId};

use super::status::LicenseStatus;

/// A license key row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LicenseKey {
    pub id: LicenseKeyId,
    /// Customer-facing code, unique and immutable (`SCO-XXXX-XXXX-XXXX`).
    pub code: String,
    pub status: LicenseStatus,
    /// Download ceiling. `None` means unlimited.
    pub max_downloads: Option<i32>,
    /// Successful consumptions so far. Never decreases.
    pub download_count: i32,
    /// `None` means the key never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_company: Option<String>,
    /// Administrator who issued the key (`None` for CLI issuance).
    pub created_by: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl LicenseKey {
    /// Whether `expires_at` lies strictly before `now`.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    /// Whether the download ceiling has been reached.
    pub fn is_quota_exhausted(&self) -> bool {
        self.max_downloads
            .is_some_and(|max| self.download_count >= max)
    }
}

/// Data required to insert a new license key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLicenseKey {
    pub code: String,
    pub max_downloads: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_company: Option<String>,
    pub created_by: Option<AccountId>,
}

impl CreateLicenseKey {
    /// Materialize the row a store would create for this request.
    ///
    /// New keys always start `unused` with zero downloads.
    pub fn into_key(self, id: LicenseKeyId, now: DateTime<Utc>) -> LicenseKey {
        LicenseKey {
            id,
            code: self.code,
            status: LicenseStatus::Unused,
            max_downloads: self.max_downloads,
            download_count: 0,
            expires_at: self.expires_at,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_company: self.customer_company,
            created_by: self.created_by,
            created_at: now,
            activated_at: None,
            last_used_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(max: Option<i32>, count: i32) -> LicenseKey {
        let mut key = CreateLicenseKey {
            code: "SCO-AAAA-BBBB-CCCC".into(),
            max_downloads: max,
            expires_at: None,
            customer_name: None,
            customer_email: None,
            customer_company: None,
            created_by: None,
        }
        .into_key(LicenseKeyId::new(), Utc::now());
        key.download_count = count;
        key
    }

    #[test]
    fn test_new_key_starts_unused() {
        let key = sample(Some(3), 0);
        assert_eq!(key.status, LicenseStatus::Unused);
        assert_eq!(key.download_count, 0);
        assert!(key.activated_at.is_none());
    }

    #[test]
    fn test_quota() {
        assert!(!sample(None, 10_000).is_quota_exhausted());
        assert!(!sample(Some(3), 2).is_quota_exhausted());
        assert!(sample(Some(3), 3).is_quota_exhausted());
        assert!(sample(Some(0), 0).is_quota_exhausted());
    }

    #[test]
    fn test_expiry_is_strict() {
        let now = Utc::now();
        let mut key = sample(None, 0);
        assert!(!key.is_past_expiry(now));
        key.expires_at = Some(now);
        assert!(!key.is_past_expiry(now));
        key.expires_at = Some(now - Duration::seconds(1));
        assert!(key.is_past_expiry(now));
    }
}
