//! One lifecycle action over many keys.
//!
//! Keys are processed independently with bounded concurrency. A failure
//! on one key is recorded and the rest carry on; per-key results are
//! folded into the report after the stream completes.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use keyhub_core::AppError;
use keyhub_core::result::AppResult;
use keyhub_core::types::LicenseKeyId;

use super::error::KeyError;
use super::service::LicenseService;
use crate::context::RequestContext;

/// Actions available to bulk requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BulkAction {
    Revoke,
    Delete,
    #[serde(alias = "extend")]
    ExtendExpiry,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revoke => "revoke",
            Self::Delete => "delete",
            Self::ExtendExpiry => "extend-expiry",
        }
    }
}

/// Why one key in a batch failed.
#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
    pub id: LicenseKeyId,
    pub code: &'static str,
    pub message: String,
}

/// Outcome of a bulk action.
#[derive(Debug, Clone, Serialize)]
pub struct BulkReport {
    pub action: BulkAction,
    /// Distinct ids processed.
    pub requested: usize,
    pub succeeded: usize,
    pub failures: Vec<BulkFailure>,
}

/// Applies a [`BulkAction`] to a set of keys.
#[derive(Debug, Clone)]
pub struct BulkOrchestrator {
    licenses: Arc<LicenseService>,
    concurrency: usize,
}

impl BulkOrchestrator {
    pub fn new(licenses: Arc<LicenseService>, concurrency: usize) -> Self {
        Self {
            licenses,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run(
        &self,
        ctx: &RequestContext,
        action: BulkAction,
        ids: &[LicenseKeyId],
    ) -> AppResult<BulkReport> {
        if !ctx.is_admin() {
            return Err(KeyError::Unauthorized.into());
        }
        let ids = dedup(ids);
        if ids.is_empty() {
            return Err(AppError::validation("At least one key id is required"));
        }
        let max = self.licenses.max_batch_size();
        if ids.len() > max {
            return Err(AppError::validation(format!(
                "At most {max} keys can be processed at once"
            )));
        }

        let results: Vec<(LicenseKeyId, Result<(), KeyError>)> = stream::iter(ids.iter().copied())
            .map(|id| async move { (id, self.apply(ctx, action, id).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = BulkReport {
            action,
            requested: ids.len(),
            succeeded: 0,
            failures: Vec::new(),
        };
        for (id, result) in results {
            match result {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    warn!(key_id = %id, action = action.as_str(), error = %e, "Bulk action failed for key");
                    report.failures.push(BulkFailure {
                        id,
                        code: e.code(),
                        message: e.to_string(),
                    });
                }
            }
        }
        // Keep failures in request order regardless of completion order.
        report
            .failures
            .sort_by_key(|f| ids.iter().position(|id| *id == f.id));

        info!(
            actor = ?ctx.account_id(),
            action = action.as_str(),
            requested = report.requested,
            succeeded = report.succeeded,
            failed = report.failures.len(),
            "Bulk action completed"
        );
        Ok(report)
    }

    async fn apply(
        &self,
        ctx: &RequestContext,
        action: BulkAction,
        id: LicenseKeyId,
    ) -> Result<(), KeyError> {
        match action {
            BulkAction::Revoke => self.licenses.revoke(ctx, id).await.map(|_| ()),
            BulkAction::Delete => self.licenses.delete(ctx, id).await,
            BulkAction::ExtendExpiry => self.licenses.extend_expiry(ctx, id).await.map(|_| ()),
        }
    }
}

/// Drop repeated ids, keeping first occurrences in order.
fn dedup(ids: &[LicenseKeyId]) -> Vec<LicenseKeyId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
