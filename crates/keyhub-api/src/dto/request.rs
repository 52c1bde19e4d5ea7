//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use keyhub_core::types::LicenseKeyId;
use keyhub_entity::license::LicenseStatus;
use keyhub_service::license::BulkAction;
use keyhub_service::{DownloadRequest, IssueSpec};

/// Login body for either identity domain.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email is not valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Public read-only key check.
///
/// The code is not validated here; the license service parses it and a
/// bad shape answers exactly like an unknown key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateKeyRequest {
    pub license_key: String,
}

/// Public licensed download.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LicensedDownloadRequest {
    pub license_key: String,
    #[validate(length(min = 1, max = 32, message = "Platform is required"))]
    pub platform: String,
    #[validate(length(max = 64))]
    pub product_version: Option<String>,
}

impl LicensedDownloadRequest {
    pub fn download(&self) -> DownloadRequest {
        DownloadRequest {
            platform: self.platform.clone(),
            product_version: self.product_version.clone(),
        }
    }
}

/// Technician download that is not gated by a license key.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TechnicianDownloadRequest {
    #[validate(length(min = 1, max = 32, message = "Platform is required"))]
    pub platform: String,
    #[validate(length(max = 64))]
    pub product_version: Option<String>,
}

impl TechnicianDownloadRequest {
    pub fn download(&self) -> DownloadRequest {
        DownloadRequest {
            platform: self.platform.clone(),
            product_version: self.product_version.clone(),
        }
    }
}

fn default_count() -> u32 {
    1
}

/// Admin batch issue.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IssueKeysRequest {
    #[serde(default = "default_count")]
    #[validate(range(min = 1, message = "Count must be at least 1"))]
    pub count: u32,
    #[validate(range(min = 0, message = "max_downloads must not be negative"))]
    pub max_downloads: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    #[validate(length(max = 255))]
    pub customer_name: Option<String>,
    #[validate(email(message = "Customer email is not valid"))]
    pub customer_email: Option<String>,
    #[validate(length(max = 255))]
    pub customer_company: Option<String>,
}

impl IssueKeysRequest {
    pub fn spec(&self) -> IssueSpec {
        IssueSpec {
            max_downloads: self.max_downloads,
            expires_at: self.expires_at,
            customer_name: trimmed(&self.customer_name),
            customer_email: trimmed(&self.customer_email),
            customer_company: trimmed(&self.customer_company),
        }
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Admin bulk action over key ids.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkKeysRequest {
    pub action: BulkAction,
    #[validate(length(min = 1, message = "At least one key id is required"))]
    pub ids: Vec<LicenseKeyId>,
}

/// Filters for the admin key listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyListQuery {
    pub status: Option<LicenseStatus>,
    pub search: Option<String>,
}

/// Filters for the admin download log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadLogQuery {
    pub license_key_id: Option<LicenseKeyId>,
    pub success: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::validated;

    #[test]
    fn test_issue_defaults_to_one_key() {
        let req: IssueKeysRequest = serde_json::from_str("{}").expect("parse");
        assert_eq!(req.count, 1);
        assert!(validated(req).is_ok());
    }

    #[test]
    fn test_issue_rejects_bad_email_and_negative_quota() {
        let req: IssueKeysRequest =
            serde_json::from_str(r#"{"max_downloads": -2, "customer_email": "nope"}"#)
                .expect("parse");
        let err = validated(req).expect_err("invalid");
        assert!(err.message.contains("customer_email"));
        assert!(err.message.contains("max_downloads"));
    }

    #[test]
    fn test_customer_fields_are_trimmed() {
        let req = IssueKeysRequest {
            count: 1,
            max_downloads: None,
            expires_at: None,
            customer_name: Some("  Ada  ".into()),
            customer_email: None,
            customer_company: Some("   ".into()),
        };
        let spec = req.spec();
        assert_eq!(spec.customer_name.as_deref(), Some("Ada"));
        assert_eq!(spec.customer_company, None);
    }

    #[test]
    fn test_download_rules_ignore_key_shape() {
        for code in ["", "SCO-AAAA-BBBB-CCCC-DDDD-EEEE-FFFF-GGGG-HHHH-JJJJ-KKKK-LLLL-MMMM-NNNN"] {
            let req = LicensedDownloadRequest {
                license_key: code.to_string(),
                platform: "windows".into(),
                product_version: None,
            };
            assert!(validated(req).is_ok(), "key shape must be left to the service");
        }
    }

    #[test]
    fn test_bulk_requires_ids() {
        let req: BulkKeysRequest =
            serde_json::from_str(r#"{"action": "revoke", "ids": []}"#).expect("parse");
        assert!(validated(req).is_err());
    }
}
