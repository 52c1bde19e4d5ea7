//! License key status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a license key.
///
/// `Revoked` and `Expired` are terminal: no operation moves a key out of
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "license_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// Issued but never consumed.
    Unused,
    /// Consumed at least once.
    Active,
    /// Withdrawn by an administrator.
    Revoked,
    /// Past its expiry timestamp.
    Expired,
}

impl LicenseStatus {
    pub const ALL: [LicenseStatus; 4] = [Self::Unused, Self::Active, Self::Revoked, Self::Expired];

    /// Whether the key can never be consumed again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked | Self::Expired)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Active => "active",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseStatus {
    type Err = keyhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unused" => Ok(Self::Unused),
            "active" => Ok(Self::Active),
            "revoked" => Ok(Self::Revoked),
            "expired" => Ok(Self::Expired),
            _ => Err(keyhub_core::AppError::validation(format!(
                "Invalid license status: '{s}'. Expected one of: unused, active, revoked, expired"
            ))),
        }
    }
}
