//! Download log browsing.

use axum::Json;
use axum::extract::{Query, State};

use keyhub_core::types::PageResponse;
use keyhub_database::store::DownloadLogFilter;
use keyhub_entity::download::DownloadLogEntry;

use crate::dto::request::DownloadLogQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::{AdminSession, PaginationParams};
use crate::state::AppState;

/// GET /api/admin/downloads
pub async fn list_downloads(
    State(state): State<AppState>,
    _auth: AdminSession,
    Query(pagination): Query<PaginationParams>,
    Query(query): Query<DownloadLogQuery>,
) -> ApiResult<Json<ApiResponse<PageResponse<DownloadLogEntry>>>> {
    let filter = DownloadLogFilter {
        license_key_id: query.license_key_id,
        success: query.success,
    };
    let page = state
        .licenses
        .download_logs(&filter, pagination.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}
