//! Turns download attempts into log entries.
//!
//! Logging is best effort: a log entry that cannot be written is reported
//! with `warn!` and never undoes a download that already happened.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use keyhub_core::result::AppResult;
use keyhub_core::AppError;
use keyhub_database::store::{KeyStore, LogWrite};
use keyhub_entity::download::{CreateDownloadLogEntry, DownloadLogEntry};
use keyhub_entity::license::LicenseKey;

use crate::context::RequestContext;
use crate::license::KeyError;

const MAX_FIELD_LEN: usize = 255;

/// Client-supplied details of a download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Target platform, e.g. `windows`, `macos`, `linux`.
    pub platform: String,
    pub product_version: Option<String>,
}

impl DownloadRequest {
    /// Trim and lower-case the platform; reject empty or oversized input.
    pub fn normalized(&self) -> AppResult<Self> {
        let platform = self.platform.trim().to_lowercase();
        if platform.is_empty() || platform.len() > 32 {
            return Err(AppError::validation("Platform must be 1 to 32 characters"));
        }
        if !platform
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::validation(
                "Platform may only contain letters, digits, '-' and '_'",
            ));
        }
        let product_version = self
            .product_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        if let Some(version) = &product_version {
            if version.len() > 64
                || !version
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
            {
                return Err(AppError::validation(
                    "Product version may only contain letters, digits, '.', '-' and '_'",
                ));
            }
        }
        Ok(Self {
            platform,
            product_version,
        })
    }

    /// Link to the installer for this platform and version.
    pub fn download_url(&self, base_url: &str) -> String {
        let version = self.product_version.as_deref().unwrap_or("latest");
        format!("{}/{}/{}", base_url.trim_end_matches('/'), version, self.platform)
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Records download attempts in the append-only log.
#[derive(Clone)]
pub struct DownloadAccounting {
    store: Arc<dyn KeyStore>,
}

impl std::fmt::Debug for DownloadAccounting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadAccounting").finish()
    }
}

impl DownloadAccounting {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Build the entry for a download that is about to be committed.
    pub fn success_entry(
        &self,
        key: &LicenseKey,
        request: &DownloadRequest,
        ctx: &RequestContext,
    ) -> CreateDownloadLogEntry {
        entry(Some(key), request, ctx, None)
    }

    /// Report the fate of a log entry written together with a consumption.
    pub fn settle(&self, key: &LicenseKey, log: LogWrite) -> Option<DownloadLogEntry> {
        match log {
            LogWrite::Written(entry) => {
                info!(
                    key_id = %key.id,
                    log_id = %entry.id,
                    platform = %entry.platform,
                    download_count = key.download_count,
                    "Licensed download recorded"
                );
                Some(entry)
            }
            LogWrite::Failed(e) => {
                warn!(
                    key_id = %key.id,
                    error = %e,
                    "Download succeeded but its log entry was lost"
                );
                None
            }
            LogWrite::NotRequested => None,
        }
    }

    /// Log a refused attempt against an existing key.
    pub async fn record_failure(
        &self,
        key: &LicenseKey,
        request: &DownloadRequest,
        ctx: &RequestContext,
        reason: &KeyError,
    ) {
        let entry = entry(Some(key), request, ctx, Some(reason.code()));
        if let Err(e) = self.store.append_log(entry).await {
            warn!(key_id = %key.id, reason = reason.code(), error = %e, "Failed to log refused download");
        }
    }

    /// Log a download that is not gated by a license key.
    pub async fn record_unlicensed(
        &self,
        request: &DownloadRequest,
        ctx: &RequestContext,
    ) -> Option<DownloadLogEntry> {
        match self.store.append_log(entry(None, request, ctx, None)).await {
            Ok(row) => {
                info!(
                    log_id = %row.id,
                    technician_id = ?row.technician_id,
                    platform = %row.platform,
                    "Unlicensed download recorded"
                );
                Some(row)
            }
            Err(e) => {
                warn!(error = %e, "Failed to log unlicensed download");
                None
            }
        }
    }
}

fn entry(
    key: Option<&LicenseKey>,
    request: &DownloadRequest,
    ctx: &RequestContext,
    failure: Option<&'static str>,
) -> CreateDownloadLogEntry {
    CreateDownloadLogEntry {
        license_key_id: key.map(|k| k.id),
        technician_id: ctx.technician_id(),
        platform: request.platform.clone(),
        product_version: request.product_version.clone(),
        ip_address: ctx.ip_address.as_deref().map(|ip| truncate(ip, 64)),
        user_agent: ctx
            .user_agent
            .as_deref()
            .map(|ua| truncate(ua, MAX_FIELD_LEN)),
        success: failure.is_none(),
        failure_reason: failure.map(str::to_string),
    }
}
