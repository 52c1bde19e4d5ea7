//! Download log repository implementation.

use sqlx::{PgExecutor, PgPool};

use keyhub_core::error::{AppError, ErrorKind};
use keyhub_core::result::AppResult;
use keyhub_core::types::{DownloadLogId, PageRequest, PageResponse};
use keyhub_entity::download::{CreateDownloadLogEntry, DownloadLogEntry};

use crate::store::DownloadLogFilter;

const FILTER_CLAUSE: &str =
    "($1::uuid IS NULL OR license_key_id = $1) AND ($2::boolean IS NULL OR success = $2)";

/// Repository for the append-only `download_logs` table.
#[derive(Debug, Clone)]
pub struct DownloadLogRepository {
    pool: PgPool,
}

impl DownloadLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, entry: &CreateDownloadLogEntry) -> AppResult<DownloadLogEntry> {
        Self::insert_on(&self.pool, entry).await
    }

    /// Insert on any executor, so the entry can share a transaction with a
    /// key update.
    pub async fn insert_on<'e, E>(
        executor: E,
        entry: &CreateDownloadLogEntry,
    ) -> AppResult<DownloadLogEntry>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, DownloadLogEntry>(
            "INSERT INTO download_logs \
             (id, license_key_id, technician_id, platform, product_version, \
              ip_address, user_agent, success, failure_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(DownloadLogId::new())
        .bind(entry.license_key_id)
        .bind(entry.technician_id)
        .bind(&entry.platform)
        .bind(&entry.product_version)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.success)
        .bind(&entry.failure_reason)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to append download log", e)
        })
    }

    pub async fn list(
        &self,
        filter: &DownloadLogFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<DownloadLogEntry>> {
        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM download_logs WHERE {FILTER_CLAUSE}"))
                .bind(filter.license_key_id)
                .bind(filter.success)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count download logs", e)
                })?;

        let entries = sqlx::query_as::<_, DownloadLogEntry>(&format!(
            "SELECT * FROM download_logs WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC, id LIMIT $3 OFFSET $4"
        ))
        .bind(filter.license_key_id)
        .bind(filter.success)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list download logs", e))?;

        Ok(PageResponse::new(entries, page, total.max(0) as u64))
    }
}
