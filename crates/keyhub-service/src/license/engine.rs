//! Key lifecycle decisions.
//!
//! Every function here looks at one snapshot of a key and a point in time
//! and says what should happen. Nothing here touches storage: the caller
//! commits the returned transition with a conditional update and starts
//! over if the row changed in the meantime.

use chrono::{DateTime, Duration, Utc};

use keyhub_entity::license::{KeyTransition, KeyUpdate, LicenseKey, LicenseStatus};

use super::error::KeyError;

/// Downloads left on a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Limited(u32),
    Unlimited,
}

impl Remaining {
    pub fn of(key: &LicenseKey) -> Self {
        match key.max_downloads {
            Some(max) => Self::Limited(u32::try_from(max - key.download_count).unwrap_or(0)),
            None => Self::Unlimited,
        }
    }

    /// `None` stands for unlimited.
    pub fn as_option(&self) -> Option<u32> {
        match self {
            Self::Limited(n) => Some(*n),
            Self::Unlimited => None,
        }
    }
}

/// Whether a key may be used for a download right now.
#[derive(Debug, Clone)]
pub enum Verdict {
    Usable,
    /// The key is past its expiry: record `expired`, then fail with
    /// [`KeyError::Expired`].
    ExpireNow(KeyTransition),
    Rejected(KeyError),
}

fn terminal_error(status: LicenseStatus) -> Option<KeyError> {
    match status {
        LicenseStatus::Revoked => Some(KeyError::Revoked),
        LicenseStatus::Expired => Some(KeyError::Expired),
        LicenseStatus::Unused | LicenseStatus::Active => None,
    }
}

/// Run the checks in order: terminal status, lazy expiry, quota.
pub fn assess(key: &LicenseKey, now: DateTime<Utc>) -> Verdict {
    if let Some(err) = terminal_error(key.status) {
        return Verdict::Rejected(err);
    }
    if key.is_past_expiry(now) {
        return Verdict::ExpireNow(KeyTransition::new(
            key,
            KeyUpdate::status(LicenseStatus::Expired),
        ));
    }
    if key.is_quota_exhausted() {
        return Verdict::Rejected(KeyError::QuotaExceeded);
    }
    Verdict::Usable
}

/// Spend one download on a key that [`assess`] found usable.
///
/// The first consumption moves `unused` to `active` and stamps
/// `activated_at`; every consumption bumps the counter and `last_used_at`.
/// The transition only requires the key to still be usable, so parallel
/// downloads on one key do not force each other to retry.
pub fn consumption(key: &LicenseKey, now: DateTime<Utc>) -> KeyTransition {
    let first_use = key.status == LicenseStatus::Unused;
    KeyTransition::live(
        key,
        KeyUpdate {
            status: LicenseStatus::Active,
            increment_downloads: true,
            activated_at: first_use.then_some(now),
            last_used_at: Some(now),
            expires_at: None,
        },
    )
}

/// Withdraw a key.
///
/// `Ok(None)` when it is already revoked. An expired key stays expired.
pub fn revocation(key: &LicenseKey) -> Result<Option<KeyTransition>, KeyError> {
    match key.status {
        LicenseStatus::Revoked => Ok(None),
        LicenseStatus::Expired => Err(KeyError::Expired),
        LicenseStatus::Unused | LicenseStatus::Active => Ok(Some(KeyTransition::new(
            key,
            KeyUpdate::status(LicenseStatus::Revoked),
        ))),
    }
}

/// Push the expiry out by `extension`, counted from the later of the
/// current expiry and `now`.
///
/// `Ok(None)` for keys without an expiry, which never expire anyway.
/// Terminal keys are refused with their terminal error and the status is
/// never changed.
pub fn extension(
    key: &LicenseKey,
    now: DateTime<Utc>,
    extension: Duration,
) -> Result<Option<KeyTransition>, KeyError> {
    if let Some(err) = terminal_error(key.status) {
        return Err(err);
    }
    let Some(current) = key.expires_at else {
        return Ok(None);
    };
    let mut update = KeyUpdate::status(key.status);
    update.expires_at = Some(current.max(now) + extension);
    Ok(Some(KeyTransition::new(key, update)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyhub_core::types::LicenseKeyId;
    use keyhub_entity::license::CreateLicenseKey;

    fn key(max: Option<i32>, count: i32, status: LicenseStatus) -> LicenseKey {
        let mut key = CreateLicenseKey {
            code: "SCO-AAAA-BBBB-CCCC".into(),
            max_downloads: max,
            expires_at: None,
            customer_name: None,
            customer_email: None,
            customer_company: None,
            created_by: None,
        }
        .into_key(LicenseKeyId::new(), Utc::now() - Duration::days(1));
        key.download_count = count;
        key.status = status;
        key
    }

    fn rejected(verdict: Verdict) -> KeyError {
        match verdict {
            Verdict::Rejected(err) => err,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_first_consumption_activates() {
        let now = Utc::now();
        let key = key(Some(3), 0, LicenseStatus::Unused);
        assert!(matches!(assess(&key, now), Verdict::Usable));

        let next = consumption(&key, now).apply_to(&key).expect("applies");
        assert_eq!(next.status, LicenseStatus::Active);
        assert_eq!(next.download_count, 1);
        assert_eq!(next.activated_at, Some(now));
        assert_eq!(next.last_used_at, Some(now));
        assert_eq!(Remaining::of(&next), Remaining::Limited(2));
    }

    #[test]
    fn test_later_consumption_keeps_activation_stamp() {
        let key = key(None, 4, LicenseStatus::Active);
        let transition = consumption(&key, Utc::now());
        assert_eq!(transition.update.activated_at, None);
        assert_eq!(transition.update.status, LicenseStatus::Active);
        assert_eq!(Remaining::of(&key), Remaining::Unlimited);
        assert_eq!(Remaining::Unlimited.as_option(), None);
    }

    #[test]
    fn test_quota_exhausted() {
        let key = key(Some(3), 3, LicenseStatus::Active);
        assert!(matches!(rejected(assess(&key, Utc::now())), KeyError::QuotaExceeded));
        assert_eq!(Remaining::of(&key).as_option(), Some(0));
    }

    #[test]
    fn test_terminal_status_wins_over_expiry_and_quota() {
        let mut revoked = key(Some(1), 1, LicenseStatus::Revoked);
        revoked.expires_at = Some(Utc::now() - Duration::days(1));
        assert!(matches!(rejected(assess(&revoked, Utc::now())), KeyError::Revoked));

        let expired = key(None, 0, LicenseStatus::Expired);
        assert!(matches!(rejected(assess(&expired, Utc::now())), KeyError::Expired));
    }

    #[test]
    fn test_past_expiry_expires_lazily_before_quota() {
        let mut key = key(Some(1), 1, LicenseStatus::Unused);
        key.expires_at = Some(Utc::now() - Duration::minutes(1));
        match assess(&key, Utc::now()) {
            Verdict::ExpireNow(transition) => {
                assert_eq!(transition.update.status, LicenseStatus::Expired);
                assert!(!transition.update.increment_downloads);
            }
            other => panic!("expected expiry, got {other:?}"),
        }
    }

    #[test]
    fn test_revocation() {
        let active = key(None, 2, LicenseStatus::Active);
        let transition = revocation(&active).expect("allowed").expect("writes");
        assert_eq!(transition.update.status, LicenseStatus::Revoked);
        assert!(!transition.update.increment_downloads);

        assert!(revocation(&key(None, 0, LicenseStatus::Revoked))
            .expect("idempotent")
            .is_none());
        assert!(matches!(
            revocation(&key(None, 0, LicenseStatus::Expired)),
            Err(KeyError::Expired)
        ));
    }

    #[test]
    fn test_extension_counts_from_later_of_now_and_expiry() {
        let now = Utc::now();
        let thirty = Duration::days(30);

        let mut future = key(None, 0, LicenseStatus::Active);
        future.expires_at = Some(now + Duration::days(10));
        let transition = extension(&future, now, thirty).expect("allowed").expect("writes");
        assert_eq!(transition.update.expires_at, Some(now + Duration::days(40)));
        assert_eq!(transition.update.status, LicenseStatus::Active);

        let mut lapsed = key(None, 0, LicenseStatus::Unused);
        lapsed.expires_at = Some(now - Duration::days(10));
        let transition = extension(&lapsed, now, thirty).expect("allowed").expect("writes");
        assert_eq!(transition.update.expires_at, Some(now + thirty));
        assert_eq!(transition.update.status, LicenseStatus::Unused);
    }

    #[test]
    fn test_extension_leaves_open_ended_keys_alone() {
        let key = key(None, 0, LicenseStatus::Unused);
        assert!(extension(&key, Utc::now(), Duration::days(30))
            .expect("allowed")
            .is_none());
    }

    #[test]
    fn test_extension_refuses_terminal_keys() {
        let mut revoked = key(None, 0, LicenseStatus::Revoked);
        revoked.expires_at = Some(Utc::now());
        assert!(matches!(
            extension(&revoked, Utc::now(), Duration::days(30)),
            Err(KeyError::Revoked)
        ));
    }
}
