//! License key management.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use keyhub_core::types::PageResponse;
use keyhub_database::store::{KeyFilter, KeyStats};
use keyhub_service::BulkReport;

use crate::dto::request::{BulkKeysRequest, IssueKeysRequest, KeyListQuery};
use crate::dto::response::{ApiResponse, IssueKeysResponse, LicenseKeyResponse, MessageResponse};
use crate::dto::validated;
use crate::error::ApiResult;
use crate::extractors::{AdminSession, PaginationParams, parse_key_id};
use crate::state::AppState;

/// GET /api/admin/keys
pub async fn list_keys(
    State(state): State<AppState>,
    _auth: AdminSession,
    Query(pagination): Query<PaginationParams>,
    Query(query): Query<KeyListQuery>,
) -> ApiResult<Json<ApiResponse<PageResponse<LicenseKeyResponse>>>> {
    let filter = KeyFilter {
        status: query.status,
        search: query.search,
    };
    let page = state
        .licenses
        .list(&filter, pagination.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page.map(LicenseKeyResponse::from))))
}

/// GET /api/admin/keys/stats
pub async fn key_stats(
    State(state): State<AppState>,
    _auth: AdminSession,
) -> ApiResult<Json<ApiResponse<KeyStats>>> {
    Ok(Json(ApiResponse::ok(state.licenses.stats().await?)))
}

/// GET /api/admin/keys/{id}
pub async fn get_key(
    State(state): State<AppState>,
    _auth: AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<LicenseKeyResponse>>> {
    let key = state.licenses.get(parse_key_id(&id)?).await?;
    Ok(Json(ApiResponse::ok(key.into())))
}

/// POST /api/admin/keys
pub async fn issue_keys(
    State(state): State<AppState>,
    auth: AdminSession,
    Json(req): Json<IssueKeysRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<IssueKeysResponse>>)> {
    let req = validated(req)?;
    let report = state.licenses.issue(&auth.ctx, &req.spec(), req.count).await?;

    let body = IssueKeysResponse {
        requested: report.requested,
        failed: report.failed,
        keys: report.issued.into_iter().map(LicenseKeyResponse::from).collect(),
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(body))))
}

/// POST /api/admin/keys/{id}/revoke
pub async fn revoke_key(
    State(state): State<AppState>,
    auth: AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<LicenseKeyResponse>>> {
    let key = state.licenses.revoke(&auth.ctx, parse_key_id(&id)?).await?;
    Ok(Json(ApiResponse::ok(key.into())))
}

/// POST /api/admin/keys/{id}/extend
pub async fn extend_key(
    State(state): State<AppState>,
    auth: AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<LicenseKeyResponse>>> {
    let key = state
        .licenses
        .extend_expiry(&auth.ctx, parse_key_id(&id)?)
        .await?;
    Ok(Json(ApiResponse::ok(key.into())))
}

/// DELETE /api/admin/keys/{id}
pub async fn delete_key(
    State(state): State<AppState>,
    auth: AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.licenses.delete(&auth.ctx, parse_key_id(&id)?).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("License key deleted"))))
}

/// POST /api/admin/keys/bulk
pub async fn bulk_keys(
    State(state): State<AppState>,
    auth: AdminSession,
    Json(req): Json<BulkKeysRequest>,
) -> ApiResult<Json<ApiResponse<BulkReport>>> {
    let req = validated(req)?;
    let report = state.bulk.run(&auth.ctx, req.action, &req.ids).await?;
    Ok(Json(ApiResponse::ok(report)))
}
