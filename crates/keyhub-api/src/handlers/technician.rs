//! Technician portal downloads.

use axum::Json;
use axum::extract::State;

use crate::dto::request::TechnicianDownloadRequest;
use crate::dto::response::{ApiResponse, DownloadResponse};
use crate::dto::validated;
use crate::error::ApiResult;
use crate::extractors::TechnicianSession;
use crate::state::AppState;

/// POST /api/technician/downloads
///
/// Not gated by a license key. The log entry is bound to the technician.
pub async fn technician_download(
    State(state): State<AppState>,
    auth: TechnicianSession,
    Json(req): Json<TechnicianDownloadRequest>,
) -> ApiResult<Json<ApiResponse<DownloadResponse>>> {
    let download = validated(req)?.download().normalized()?;
    let entry = state.accounting.record_unlicensed(&download, &auth.ctx).await;

    Ok(Json(ApiResponse::ok(DownloadResponse {
        download_url: download.download_url(&state.config.license.download_base_url),
        remaining_downloads: None,
        log_id: entry.map(|e| e.id),
    })))
}
