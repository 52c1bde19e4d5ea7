//! Typed path parameter helpers.

use keyhub_core::AppError;
use keyhub_core::types::LicenseKeyId;

/// Parses a license key id from a path segment.
pub fn parse_key_id(s: &str) -> Result<LicenseKeyId, AppError> {
    s.parse()
        .map_err(|_| AppError::validation(format!("Invalid license key id: {s}")))
}
