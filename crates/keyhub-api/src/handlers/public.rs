//! Unauthenticated key validation and licensed downloads.
//!
//! Callers here get no hint whether a code was malformed or simply
//! unknown; both answer 404 `INVALID_KEY`.

use axum::Json;
use axum::extract::State;

use keyhub_service::{KeyError, RequestContext};

use crate::dto::request::{LicensedDownloadRequest, ValidateKeyRequest};
use crate::dto::response::{ApiResponse, DownloadResponse, KeyValidityResponse};
use crate::dto::validated;
use crate::error::{ApiError, ApiResult};
use crate::extractors::ClientInfo;
use crate::state::AppState;

fn public_error(err: KeyError) -> ApiError {
    ApiError::from(err.concealed())
}

/// POST /api/licenses/validate
pub async fn validate_key(
    State(state): State<AppState>,
    Json(req): Json<ValidateKeyRequest>,
) -> ApiResult<Json<ApiResponse<KeyValidityResponse>>> {
    let outcome = state
        .licenses
        .validate(&req.license_key)
        .await
        .map_err(public_error)?;

    Ok(Json(ApiResponse::ok(KeyValidityResponse {
        valid: true,
        status: outcome.key.status,
        remaining_downloads: outcome.remaining.as_option(),
        expires_at: outcome.key.expires_at,
    })))
}

/// POST /api/downloads
pub async fn licensed_download(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(req): Json<LicensedDownloadRequest>,
) -> ApiResult<Json<ApiResponse<DownloadResponse>>> {
    let req = validated(req)?;
    let download = req.download().normalized()?;
    let ctx = RequestContext::anonymous(client.ip_address, client.user_agent);

    let outcome = state
        .licenses
        .validate_and_consume(&req.license_key, &download, &ctx)
        .await
        .map_err(public_error)?;

    Ok(Json(ApiResponse::ok(DownloadResponse {
        download_url: download.download_url(&state.config.license.download_base_url),
        remaining_downloads: outcome.remaining.as_option(),
        log_id: outcome.log.map(|entry| entry.id),
    })))
}
