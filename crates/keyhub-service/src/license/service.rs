//! License key lifecycle service.
//!
//! Runs the engine's decisions against the key store. Every write is a
//! conditional update on the snapshot the decision was made from; when a
//! concurrent request changes the key first, the whole read-decide-write
//! sequence is repeated a bounded number of times.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use keyhub_core::AppError;
use keyhub_core::config::LicenseConfig;
use keyhub_core::result::AppResult;
use keyhub_core::types::{LicenseKeyId, PageRequest, PageResponse};
use keyhub_database::store::{DownloadLogFilter, InsertOutcome, KeyFilter, KeyStats, KeyStore};
use keyhub_entity::download::DownloadLogEntry;
use keyhub_entity::license::{CodeFormat, CreateLicenseKey, KeyTransition, LicenseKey};

use super::engine::{self, Remaining, Verdict};
use super::error::KeyError;
use super::generator::CodeGenerator;
use crate::context::RequestContext;
use crate::download::{DownloadAccounting, DownloadRequest};

/// Terms applied to newly issued keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueSpec {
    pub max_downloads: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_company: Option<String>,
}

/// Result of a batch issue. Individual failures do not stop the batch.
#[derive(Debug, Clone, Serialize)]
pub struct IssueReport {
    pub requested: u32,
    pub issued: Vec<LicenseKey>,
    pub failed: u32,
}

/// A key that may be used right now.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub key: LicenseKey,
    pub remaining: Remaining,
}

/// A download that was charged to a key.
#[derive(Debug, Clone)]
pub struct ConsumptionOutcome {
    pub key: LicenseKey,
    pub remaining: Remaining,
    /// `None` if the log entry could not be written.
    pub log: Option<DownloadLogEntry>,
}

/// Orchestrates the key lifecycle against a [`KeyStore`].
#[derive(Clone)]
pub struct LicenseService {
    store: Arc<dyn KeyStore>,
    accounting: Arc<DownloadAccounting>,
    generator: CodeGenerator,
    extension: Duration,
    retry_attempts: u32,
    max_code_attempts: u32,
    max_batch_size: usize,
}

impl std::fmt::Debug for LicenseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseService")
            .field("format", self.generator.format())
            .field("retry_attempts", &self.retry_attempts)
            .finish()
    }
}

fn require_admin(ctx: &RequestContext) -> Result<(), KeyError> {
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(KeyError::Unauthorized)
    }
}

impl LicenseService {
    pub fn new(
        store: Arc<dyn KeyStore>,
        accounting: Arc<DownloadAccounting>,
        config: &LicenseConfig,
    ) -> Self {
        Self {
            store,
            accounting,
            generator: CodeGenerator::new(CodeFormat::new(&config.code_prefix)),
            extension: Duration::days(config.extension_days.clamp(1, 3650)),
            retry_attempts: config.conflict_retry_attempts.max(1),
            max_code_attempts: config.max_code_attempts.max(1),
            max_batch_size: config.max_batch_size.max(1),
        }
    }

    pub fn format(&self) -> &CodeFormat {
        self.generator.format()
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    fn parse(&self, raw_code: &str) -> Result<String, KeyError> {
        self.format().parse(raw_code).ok_or(KeyError::MalformedCode)
    }

    async fn with_conflict_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt: F,
    ) -> Result<T, KeyError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, KeyError>>,
    {
        let mut tries = 0;
        loop {
            tries += 1;
            match attempt().await {
                Err(e) if e.is_retryable() && tries < self.retry_attempts => {
                    debug!(operation, attempt = tries, "Concurrent update on key, retrying");
                }
                Err(e) if e.is_retryable() => {
                    warn!(operation, attempts = tries, "Giving up after repeated concurrent updates");
                    return Err(e);
                }
                other => return other,
            }
        }
    }

    async fn commit(&self, transition: &KeyTransition) -> Result<LicenseKey, KeyError> {
        match self.store.apply_if(transition, None).await? {
            Some(applied) => Ok(applied.key),
            None => Err(KeyError::StorageConflict),
        }
    }

    /// Record a lazily detected expiry. Always ends in an error.
    async fn expire(&self, transition: &KeyTransition) -> KeyError {
        match self.commit(transition).await {
            Ok(key) => {
                info!(key_id = %key.id, "License key expired on access");
                KeyError::Expired
            }
            Err(e) => e,
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<LicenseKey, KeyError> {
        self.store.find_by_code(code).await?.ok_or(KeyError::NotFound)
    }

    async fn find_by_id(&self, id: LicenseKeyId) -> Result<LicenseKey, KeyError> {
        self.store.find_by_id(id).await?.ok_or(KeyError::NotFound)
    }

    /// Check a key without spending a download.
    ///
    /// A key found past its expiry is still marked `expired`.
    pub async fn validate(&self, raw_code: &str) -> Result<ValidationOutcome, KeyError> {
        let code = self.parse(raw_code)?;
        self.with_conflict_retry("validate", || self.try_validate(&code))
            .await
    }

    async fn try_validate(&self, code: &str) -> Result<ValidationOutcome, KeyError> {
        let key = self.find_by_code(code).await?;
        match engine::assess(&key, Utc::now()) {
            Verdict::Usable => Ok(ValidationOutcome {
                remaining: Remaining::of(&key),
                key,
            }),
            Verdict::ExpireNow(transition) => Err(self.expire(&transition).await),
            Verdict::Rejected(e) => Err(e),
        }
    }

    /// Spend one download on a key and log it.
    ///
    /// The status change, counter increment and log entry are committed
    /// together. Refused attempts against an existing key are logged too.
    pub async fn validate_and_consume(
        &self,
        raw_code: &str,
        request: &DownloadRequest,
        ctx: &RequestContext,
    ) -> Result<ConsumptionOutcome, KeyError> {
        let code = self.parse(raw_code)?;
        self.with_conflict_retry("consume", || self.try_consume(&code, request, ctx))
            .await
    }

    async fn try_consume(
        &self,
        code: &str,
        request: &DownloadRequest,
        ctx: &RequestContext,
    ) -> Result<ConsumptionOutcome, KeyError> {
        let key = self.find_by_code(code).await?;
        let now = Utc::now();

        let refusal = match engine::assess(&key, now) {
            Verdict::Usable => None,
            Verdict::ExpireNow(transition) => Some(self.expire(&transition).await),
            Verdict::Rejected(e) => Some(e),
        };
        if let Some(e) = refusal {
            if !e.is_retryable() {
                self.accounting.record_failure(&key, request, ctx, &e).await;
            }
            return Err(e);
        }

        let transition = engine::consumption(&key, now);
        let entry = self.accounting.success_entry(&key, request, ctx);
        let Some(applied) = self.store.apply_if(&transition, Some(entry)).await? else {
            return Err(KeyError::StorageConflict);
        };

        let log = self.accounting.settle(&applied.key, applied.log);
        Ok(ConsumptionOutcome {
            remaining: Remaining::of(&applied.key),
            key: applied.key,
            log,
        })
    }

    /// Revoke a key. Revoking an already revoked key succeeds.
    pub async fn revoke(
        &self,
        ctx: &RequestContext,
        id: LicenseKeyId,
    ) -> Result<LicenseKey, KeyError> {
        require_admin(ctx)?;
        let key = self
            .with_conflict_retry("revoke", || self.try_revoke(id))
            .await?;
        info!(key_id = %id, actor = ?ctx.account_id(), "License key revoked");
        Ok(key)
    }

    async fn try_revoke(&self, id: LicenseKeyId) -> Result<LicenseKey, KeyError> {
        let key = self.find_by_id(id).await?;
        match engine::revocation(&key)? {
            Some(transition) => self.commit(&transition).await,
            None => Ok(key),
        }
    }

    /// Extend a key's expiry by the configured number of days.
    pub async fn extend_expiry(
        &self,
        ctx: &RequestContext,
        id: LicenseKeyId,
    ) -> Result<LicenseKey, KeyError> {
        require_admin(ctx)?;
        let key = self
            .with_conflict_retry("extend", || self.try_extend(id))
            .await?;
        info!(key_id = %id, expires_at = ?key.expires_at, "License key expiry extended");
        Ok(key)
    }

    async fn try_extend(&self, id: LicenseKeyId) -> Result<LicenseKey, KeyError> {
        let key = self.find_by_id(id).await?;
        match engine::extension(&key, Utc::now(), self.extension)? {
            Some(transition) => self.commit(&transition).await,
            None => Ok(key),
        }
    }

    /// Permanently remove a key. Its download history is kept.
    pub async fn delete(&self, ctx: &RequestContext, id: LicenseKeyId) -> Result<(), KeyError> {
        require_admin(ctx)?;
        if !self.store.delete(id).await? {
            return Err(KeyError::NotFound);
        }
        info!(key_id = %id, actor = ?ctx.account_id(), "License key deleted");
        Ok(())
    }

    /// Issue one key with a fresh code, drawing again on collisions.
    pub async fn issue_one(&self, ctx: &RequestContext, spec: &IssueSpec) -> AppResult<LicenseKey> {
        require_admin(ctx)?;
        validate_spec(spec, Utc::now())?;
        self.insert_unique(ctx, spec).await
    }

    async fn insert_unique(&self, ctx: &RequestContext, spec: &IssueSpec) -> AppResult<LicenseKey> {
        for attempt in 1..=self.max_code_attempts {
            let data = CreateLicenseKey {
                code: self.generator.generate(),
                max_downloads: spec.max_downloads,
                expires_at: spec.expires_at,
                customer_name: spec.customer_name.clone(),
                customer_email: spec.customer_email.clone(),
                customer_company: spec.customer_company.clone(),
                created_by: ctx.account_id(),
            };
            match self.store.insert(data).await? {
                InsertOutcome::Inserted(key) => return Ok(key),
                InsertOutcome::CodeTaken => {
                    debug!(attempt, "Generated license code already taken, drawing again");
                }
            }
        }
        Err(AppError::conflict(format!(
            "Could not find an unused license code after {} attempts",
            self.max_code_attempts
        )))
    }

    /// Issue `count` keys with the same terms.
    pub async fn issue(
        &self,
        ctx: &RequestContext,
        spec: &IssueSpec,
        count: u32,
    ) -> AppResult<IssueReport> {
        require_admin(ctx)?;
        if count == 0 || count as usize > self.max_batch_size {
            return Err(AppError::validation(format!(
                "Count must be between 1 and {}",
                self.max_batch_size
            )));
        }
        validate_spec(spec, Utc::now())?;

        let mut issued = Vec::with_capacity(count as usize);
        let mut failed = 0u32;
        for _ in 0..count {
            match self.insert_unique(ctx, spec).await {
                Ok(key) => issued.push(key),
                Err(e) => {
                    failed += 1;
                    error!(error = %e, "Failed to issue license key in batch");
                }
            }
        }

        info!(
            actor = ?ctx.account_id(),
            requested = count,
            issued = issued.len(),
            failed,
            "License keys issued"
        );

        Ok(IssueReport {
            requested: count,
            issued,
            failed,
        })
    }

    pub async fn get(&self, id: LicenseKeyId) -> AppResult<LicenseKey> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::from(KeyError::NotFound))
    }

    pub async fn list(
        &self,
        filter: &KeyFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<LicenseKey>> {
        self.store.list(filter, page.clamped()).await
    }

    pub async fn stats(&self) -> AppResult<KeyStats> {
        self.store.stats().await
    }

    pub async fn download_logs(
        &self,
        filter: &DownloadLogFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<DownloadLogEntry>> {
        self.store.list_logs(filter, page.clamped()).await
    }
}

fn validate_spec(spec: &IssueSpec, now: DateTime<Utc>) -> AppResult<()> {
    if spec.max_downloads.is_some_and(|max| max < 0) {
        return Err(AppError::validation("max_downloads must not be negative"));
    }
    if spec.expires_at.is_some_and(|at| at <= now) {
        return Err(AppError::validation("expires_at must be in the future"));
    }
    Ok(())
}
