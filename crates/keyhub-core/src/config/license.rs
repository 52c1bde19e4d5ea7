//! License key lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Backing store for license keys and download logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// PostgreSQL via sqlx.
    #[default]
    Postgres,
    /// Process-local map. Data is lost on restart.
    Memory,
}

/// License issuance and consumption settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseConfig {
    /// Fixed product prefix of every key code (`SCO-XXXX-XXXX-XXXX`).
    #[serde(default = "default_prefix")]
    pub code_prefix: String,
    /// Days added by an expiry extension.
    #[serde(default = "default_extension_days")]
    pub extension_days: i64,
    /// Attempts for a state transition that keeps losing a concurrent race.
    #[serde(default = "default_retry_attempts")]
    pub conflict_retry_attempts: u32,
    /// Attempts to find an unused code when issuing one key.
    #[serde(default = "default_code_attempts")]
    pub max_code_attempts: u32,
    /// Maximum number of keys or ids in a single batch request.
    #[serde(default = "default_max_batch")]
    pub max_batch_size: usize,
    /// Number of keys processed concurrently during bulk operations.
    #[serde(default = "default_bulk_concurrency")]
    pub bulk_concurrency: usize,
    /// Base URL returned to clients after a successful download authorization.
    #[serde(default = "default_download_url")]
    pub download_base_url: String,
    /// Which store backs the key lifecycle.
    #[serde(default)]
    pub store: StoreBackend,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            code_prefix: default_prefix(),
            extension_days: default_extension_days(),
            conflict_retry_attempts: default_retry_attempts(),
            max_code_attempts: default_code_attempts(),
            max_batch_size: default_max_batch(),
            bulk_concurrency: default_bulk_concurrency(),
            download_base_url: default_download_url(),
            store: StoreBackend::default(),
        }
    }
}

fn default_prefix() -> String {
    "SCO".to_string()
}

fn default_extension_days() -> i64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_code_attempts() -> u32 {
    8
}

fn default_max_batch() -> usize {
    500
}

fn default_bulk_concurrency() -> usize {
    8
}

fn default_download_url() -> String {
    "https://downloads.example.com/scanner".to_string()
}
