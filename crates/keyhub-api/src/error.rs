//! Maps application errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use keyhub_core::error::{AppError, ErrorKind};

const CONCEALED_MESSAGE: &str = "Internal server error";

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// An [`AppError`] on its way out of a handler.
///
/// Anything convertible into `AppError` converts into `ApiError`, so
/// handlers can use `?` on service results directly.
#[derive(Debug)]
pub struct ApiError(pub AppError);

pub type ApiResult<T> = Result<T, ApiError>;

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization | ErrorKind::License => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::Serialization => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn default_code(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "VALIDATION_ERROR",
        ErrorKind::Authentication => "UNAUTHORIZED",
        ErrorKind::Authorization => "FORBIDDEN",
        ErrorKind::License => "LICENSE_ERROR",
        ErrorKind::NotFound => "NOT_FOUND",
        ErrorKind::Conflict => "CONFLICT",
        ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::Serialization => "INTERNAL_ERROR",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind);

        let message = if err.kind.is_server_fault() {
            tracing::error!(
                kind = %err.kind,
                error = %err.message,
                source = ?err.source,
                "Internal server error"
            );
            CONCEALED_MESSAGE.to_string()
        } else {
            err.message
        };

        let body = ApiErrorResponse {
            error: err.code.unwrap_or_else(|| default_code(err.kind)).to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyhub_service::KeyError;

    #[test]
    fn test_lifecycle_errors_map_to_statuses() {
        let cases = [
            (KeyError::MalformedCode, StatusCode::BAD_REQUEST),
            (KeyError::NotFound, StatusCode::NOT_FOUND),
            (KeyError::Revoked, StatusCode::FORBIDDEN),
            (KeyError::Expired, StatusCode::FORBIDDEN),
            (KeyError::QuotaExceeded, StatusCode::FORBIDDEN),
            (KeyError::Unauthorized, StatusCode::UNAUTHORIZED),
            (KeyError::StorageConflict, StatusCode::CONFLICT),
            (
                KeyError::InternalFailure(AppError::database("pool closed")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn test_server_faults_are_concealed() {
        let response = ApiError::from(AppError::database("password authentication failed"))
            .into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: ApiErrorResponse = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body.error, "INTERNAL_ERROR");
        assert_eq!(body.message, CONCEALED_MESSAGE);
    }

    #[tokio::test]
    async fn test_key_error_code_survives() {
        let response = ApiError::from(KeyError::QuotaExceeded).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: ApiErrorResponse = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body.error, "QUOTA_EXCEEDED");
        assert_eq!(body.message, "License key download limit reached");
    }
}
