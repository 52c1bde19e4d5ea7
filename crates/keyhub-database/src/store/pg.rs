//! PostgreSQL key store.

use async_trait::async_trait;
use sqlx::{Acquire, PgPool};
use tracing::{debug, warn};

use keyhub_core::error::{AppError, ErrorKind};
use keyhub_core::result::AppResult;
use keyhub_core::types::{LicenseKeyId, PageRequest, PageResponse};
use keyhub_entity::download::{CreateDownloadLogEntry, DownloadLogEntry};
use keyhub_entity::license::{CreateLicenseKey, KeyTransition, LicenseKey};

use super::{
    AppliedTransition, DownloadLogFilter, InsertOutcome, KeyFilter, KeyStats, KeyStore, LogWrite,
};
use crate::repositories::{DownloadLogRepository, LicenseKeyRepository};

/// Key store backed by the `license_keys` and `download_logs` tables.
#[derive(Debug, Clone)]
pub struct PgKeyStore {
    pool: PgPool,
    keys: LicenseKeyRepository,
    logs: DownloadLogRepository,
}

impl PgKeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            keys: LicenseKeyRepository::new(pool.clone()),
            logs: DownloadLogRepository::new(pool.clone()),
            pool,
        }
    }
}

fn tx_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

#[async_trait]
impl KeyStore for PgKeyStore {
    async fn find_by_code(&self, code: &str) -> AppResult<Option<LicenseKey>> {
        self.keys.find_by_code(code).await
    }

    async fn find_by_id(&self, id: LicenseKeyId) -> AppResult<Option<LicenseKey>> {
        self.keys.find_by_id(id).await
    }

    async fn insert(&self, key: CreateLicenseKey) -> AppResult<InsertOutcome> {
        Ok(match self.keys.insert(&key).await? {
            Some(row) => InsertOutcome::Inserted(row),
            None => InsertOutcome::CodeTaken,
        })
    }

    async fn apply_if(
        &self,
        transition: &KeyTransition,
        log: Option<CreateDownloadLogEntry>,
    ) -> AppResult<Option<AppliedTransition>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(tx_error("Failed to begin transaction"))?;

        let Some(key) = LicenseKeyRepository::update_if(&mut *tx, transition).await? else {
            tx.rollback()
                .await
                .map_err(tx_error("Failed to roll back transaction"))?;
            debug!(key_id = %transition.key_id, "Conditional update lost to a concurrent writer");
            return Ok(None);
        };

        let log = match log {
            None => LogWrite::NotRequested,
            Some(entry) => {
                // The savepoint confines a failed insert so the key update
                // still commits.
                let mut savepoint = tx
                    .begin()
                    .await
                    .map_err(tx_error("Failed to open savepoint"))?;
                match DownloadLogRepository::insert_on(&mut *savepoint, &entry).await {
                    Ok(row) => {
                        savepoint
                            .commit()
                            .await
                            .map_err(tx_error("Failed to release savepoint"))?;
                        LogWrite::Written(row)
                    }
                    Err(e) => {
                        savepoint
                            .rollback()
                            .await
                            .map_err(tx_error("Failed to roll back savepoint"))?;
                        warn!(key_id = %key.id, error = %e, "Download log insert failed inside transition");
                        LogWrite::Failed(e)
                    }
                }
            }
        };

        tx.commit()
            .await
            .map_err(tx_error("Failed to commit transaction"))?;

        Ok(Some(AppliedTransition { key, log }))
    }

    async fn append_log(&self, entry: CreateDownloadLogEntry) -> AppResult<DownloadLogEntry> {
        self.logs.insert(&entry).await
    }

    async fn delete(&self, id: LicenseKeyId) -> AppResult<bool> {
        self.keys.delete(id).await
    }

    async fn list(
        &self,
        filter: &KeyFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<LicenseKey>> {
        self.keys.list(filter, page).await
    }

    async fn stats(&self) -> AppResult<KeyStats> {
        self.keys.stats().await
    }

    async fn list_logs(
        &self,
        filter: &DownloadLogFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<DownloadLogEntry>> {
        self.logs.list(filter, page).await
    }
}
