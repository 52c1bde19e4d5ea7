//! Session and credential configuration.
//!
//! Administrators and technicians are separate identity domains. Each
//! domain has its own signing secret, token lifetime, and cookie.

use serde::{Deserialize, Serialize};

/// Authentication configuration for both identity domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Admin console sessions.
    #[serde(default = "default_admin")]
    pub admin: DomainSessionConfig,
    /// Technician portal sessions.
    #[serde(default = "default_technician")]
    pub technician: DomainSessionConfig,
    /// Whether session cookies carry the `Secure` attribute.
    #[serde(default)]
    pub secure_cookies: bool,
    /// Minimum password length for new accounts.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            technician: default_technician(),
            secure_cookies: false,
            password_min_length: default_password_min(),
        }
    }
}

/// Session settings for one identity domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSessionConfig {
    /// HMAC-SHA256 secret used to sign this domain's session tokens.
    pub jwt_secret: String,
    /// Session lifetime in hours.
    pub ttl_hours: u64,
    /// Name of the cookie carrying the session token.
    pub cookie_name: String,
}

fn default_admin() -> DomainSessionConfig {
    DomainSessionConfig {
        jwt_secret: "CHANGE_ME_ADMIN_SECRET".to_string(),
        ttl_hours: 8,
        cookie_name: "keyhub_admin_session".to_string(),
    }
}

fn default_technician() -> DomainSessionConfig {
    DomainSessionConfig {
        jwt_secret: "CHANGE_ME_TECHNICIAN_SECRET".to_string(),
        ttl_hours: 24 * 7,
        cookie_name: "keyhub_technician_session".to_string(),
    }
}

fn default_password_min() -> usize {
    8
}
