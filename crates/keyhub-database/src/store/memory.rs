//! In-memory key store for tests and single-node demos.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use keyhub_core::AppError;
use keyhub_core::result::AppResult;
use keyhub_core::types::{DownloadLogId, LicenseKeyId, PageRequest, PageResponse};
use keyhub_entity::download::{CreateDownloadLogEntry, DownloadLogEntry};
use keyhub_entity::license::{CreateLicenseKey, KeyTransition, LicenseKey};

use super::{
    AppliedTransition, DownloadLogFilter, InsertOutcome, KeyFilter, KeyStats, KeyStore, LogWrite,
};

#[derive(Debug, Default)]
struct InnerState {
    keys: HashMap<LicenseKeyId, LicenseKey>,
    codes: HashMap<String, LicenseKeyId>,
    logs: Vec<DownloadLogEntry>,
}

/// Key store holding everything behind one Tokio mutex.
///
/// Holding the lock across check and update gives the same per-key
/// serialization the PostgreSQL conditional update provides.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    state: Arc<Mutex<InnerState>>,
    reject_logs: Arc<AtomicBool>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent log append fail, simulating a broken log table.
    pub fn reject_log_appends(&self, reject: bool) {
        self.reject_logs.store(reject, Ordering::SeqCst);
    }

    fn write_log(
        &self,
        state: &mut InnerState,
        entry: CreateDownloadLogEntry,
    ) -> AppResult<DownloadLogEntry> {
        if self.reject_logs.load(Ordering::SeqCst) {
            return Err(AppError::database("Download log is not accepting writes"));
        }
        let row = entry.into_entry(DownloadLogId::new(), Utc::now());
        state.logs.push(row.clone());
        Ok(row)
    }
}

fn paginate<T: Clone>(items: Vec<T>, page: PageRequest) -> PageResponse<T> {
    let total = items.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    let items = items.into_iter().skip(offset).take(limit).collect();
    PageResponse::new(items, page, total)
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn find_by_code(&self, code: &str) -> AppResult<Option<LicenseKey>> {
        let state = self.state.lock().await;
        Ok(state
            .codes
            .get(code)
            .and_then(|id| state.keys.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: LicenseKeyId) -> AppResult<Option<LicenseKey>> {
        Ok(self.state.lock().await.keys.get(&id).cloned())
    }

    async fn insert(&self, key: CreateLicenseKey) -> AppResult<InsertOutcome> {
        let mut state = self.state.lock().await;
        if state.codes.contains_key(&key.code) {
            return Ok(InsertOutcome::CodeTaken);
        }
        let row = key.into_key(LicenseKeyId::new(), Utc::now());
        state.codes.insert(row.code.clone(), row.id);
        state.keys.insert(row.id, row.clone());
        Ok(InsertOutcome::Inserted(row))
    }

    async fn apply_if(
        &self,
        transition: &KeyTransition,
        log: Option<CreateDownloadLogEntry>,
    ) -> AppResult<Option<AppliedTransition>> {
        let mut state = self.state.lock().await;
        let Some(next) = state
            .keys
            .get(&transition.key_id)
            .and_then(|current| transition.apply_to(current))
        else {
            return Ok(None);
        };
        state.keys.insert(next.id, next.clone());

        let log = match log {
            None => LogWrite::NotRequested,
            Some(entry) => match self.write_log(&mut state, entry) {
                Ok(row) => LogWrite::Written(row),
                Err(e) => LogWrite::Failed(e),
            },
        };
        Ok(Some(AppliedTransition { key: next, log }))
    }

    async fn append_log(&self, entry: CreateDownloadLogEntry) -> AppResult<DownloadLogEntry> {
        let mut state = self.state.lock().await;
        self.write_log(&mut state, entry)
    }

    async fn delete(&self, id: LicenseKeyId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let Some(removed) = state.keys.remove(&id) else {
            return Ok(false);
        };
        state.codes.remove(&removed.code);
        for entry in state.logs.iter_mut() {
            if entry.license_key_id == Some(id) {
                entry.license_key_id = None;
            }
        }
        Ok(true)
    }

    async fn list(
        &self,
        filter: &KeyFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<LicenseKey>> {
        let state = self.state.lock().await;
        let mut keys: Vec<LicenseKey> = state
            .keys
            .values()
            .filter(|key| filter.matches(key))
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(keys, page))
    }

    async fn stats(&self) -> AppResult<KeyStats> {
        let state = self.state.lock().await;
        let mut stats = KeyStats::default();
        for key in state.keys.values() {
            stats.record(key.status, 1);
            stats.total_downloads += key.download_count.max(0) as u64;
        }
        Ok(stats)
    }

    async fn list_logs(
        &self,
        filter: &DownloadLogFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<DownloadLogEntry>> {
        let state = self.state.lock().await;
        let entries: Vec<DownloadLogEntry> = state
            .logs
            .iter()
            .rev()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        Ok(paginate(entries, page))
    }
}
