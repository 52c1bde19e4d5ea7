//! License key repository implementation.

use sqlx::{PgExecutor, PgPool};

use keyhub_core::error::{AppError, ErrorKind};
use keyhub_core::result::AppResult;
use keyhub_core::types::{LicenseKeyId, PageRequest, PageResponse};
use keyhub_entity::license::{CreateLicenseKey, KeyTransition, LicenseKey, LicenseStatus};

use crate::store::{KeyFilter, KeyStats};

const FILTER_CLAUSE: &str = "($1::license_status IS NULL OR status = $1) \
     AND ($2::text IS NULL OR code ILIKE $2 OR customer_email ILIKE $2 OR customer_name ILIKE $2)";

/// Repository for `license_keys` rows.
#[derive(Debug, Clone)]
pub struct LicenseKeyRepository {
    pool: PgPool,
}

impl LicenseKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: LicenseKeyId) -> AppResult<Option<LicenseKey>> {
        sqlx::query_as::<_, LicenseKey>("SELECT * FROM license_keys WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find license key", e))
    }

    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<LicenseKey>> {
        sqlx::query_as::<_, LicenseKey>("SELECT * FROM license_keys WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find license key by code", e)
            })
    }

    /// Insert a key, returning `None` if the code is already taken.
    pub async fn insert(&self, data: &CreateLicenseKey) -> AppResult<Option<LicenseKey>> {
        sqlx::query_as::<_, LicenseKey>(
            "INSERT INTO license_keys \
             (id, code, status, max_downloads, download_count, expires_at, \
              customer_name, customer_email, customer_company, created_by) \
             VALUES ($1, $2, 'unused', $3, 0, $4, $5, $6, $7, $8) \
             ON CONFLICT (code) DO NOTHING RETURNING *",
        )
        .bind(LicenseKeyId::new())
        .bind(&data.code)
        .bind(data.max_downloads)
        .bind(data.expires_at)
        .bind(&data.customer_name)
        .bind(&data.customer_email)
        .bind(&data.customer_company)
        .bind(data.created_by)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert license key", e))
    }

    /// Conditional update on any executor, so it can join a transaction.
    ///
    /// The row changes only if it still satisfies the transition's
    /// precondition and the increment stays within the ceiling.
    pub async fn update_if<'e, E>(
        executor: E,
        transition: &KeyTransition,
    ) -> AppResult<Option<LicenseKey>>
    where
        E: PgExecutor<'e>,
    {
        let update = &transition.update;
        sqlx::query_as::<_, LicenseKey>(
            "UPDATE license_keys SET \
                status = $4, \
                download_count = download_count + $5, \
                activated_at = COALESCE(activated_at, $6), \
                last_used_at = COALESCE($7, last_used_at), \
                expires_at = COALESCE($8, expires_at) \
             WHERE id = $1 \
               AND (($2::license_status IS NULL AND status IN ('unused', 'active')) OR status = $2) \
               AND ($3::int4 IS NULL OR download_count = $3) \
               AND (max_downloads IS NULL OR download_count + $5 <= max_downloads) \
             RETURNING *",
        )
        .bind(transition.key_id)
        .bind(transition.expected.status)
        .bind(transition.expected.download_count)
        .bind(update.status)
        .bind(update.download_delta())
        .bind(update.activated_at)
        .bind(update.last_used_at)
        .bind(update.expires_at)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update license key", e))
    }

    pub async fn delete(&self, id: LicenseKeyId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM license_keys WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete license key", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Newest first, optionally filtered by status and a search term.
    pub async fn list(
        &self,
        filter: &KeyFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<LicenseKey>> {
        let pattern = filter.search_pattern();

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM license_keys WHERE {FILTER_CLAUSE}"))
                .bind(filter.status)
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count license keys", e)
                })?;

        let keys = sqlx::query_as::<_, LicenseKey>(&format!(
            "SELECT * FROM license_keys WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC, id LIMIT $3 OFFSET $4"
        ))
        .bind(filter.status)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list license keys", e))?;

        Ok(PageResponse::new(keys, page, total.max(0) as u64))
    }

    pub async fn stats(&self) -> AppResult<KeyStats> {
        let rows: Vec<(LicenseStatus, i64, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*), COALESCE(SUM(download_count), 0)::BIGINT \
             FROM license_keys GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to compute license stats", e)
        })?;

        let mut stats = KeyStats::default();
        for (status, count, downloads) in rows {
            stats.record(status, count.max(0) as u64);
            stats.total_downloads += downloads.max(0) as u64;
        }
        Ok(stats)
    }
}
