//! Identity domains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two independent identity domains.
///
/// Sessions from one domain never authorize operations in the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountDomain {
    /// Back-office staff managing license keys.
    Admin,
    /// Field technicians using the portal.
    Technician,
}

impl AccountDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Technician => "technician",
        }
    }

    /// Table holding this domain's accounts.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Admin => "admin_users",
            Self::Technician => "technicians",
        }
    }

    /// JWT audience claim for this domain's sessions.
    pub fn audience(&self) -> &'static str {
        match self {
            Self::Admin => "keyhub-admin",
            Self::Technician => "keyhub-technician",
        }
    }
}

impl fmt::Display for AccountDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountDomain {
    type Err = keyhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "technician" => Ok(Self::Technician),
            _ => Err(keyhub_core::AppError::validation(format!(
                "Invalid account domain: '{s}'. Expected one of: admin, technician"
            ))),
        }
    }
}
