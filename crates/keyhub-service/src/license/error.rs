//! Lifecycle error taxonomy.

use thiserror::Error;

use keyhub_core::error::{AppError, ErrorKind};

/// Every way a lifecycle operation can fail.
///
/// Only [`KeyError::StorageConflict`] is worth retrying; everything else
/// is final for the request.
#[derive(Debug, Clone, Error)]
pub enum KeyError {
    #[error("License key format is invalid")]
    MalformedCode,
    #[error("Invalid license key")]
    NotFound,
    #[error("License key has been revoked")]
    Revoked,
    #[error("License key has expired")]
    Expired,
    #[error("License key download limit reached")]
    QuotaExceeded,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("License key was modified concurrently, please retry")]
    StorageConflict,
    #[error("Internal failure: {0}")]
    InternalFailure(AppError),
}

impl KeyError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageConflict)
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedCode => "MALFORMED_KEY",
            Self::NotFound => "INVALID_KEY",
            Self::Revoked => "KEY_REVOKED",
            Self::Expired => "KEY_EXPIRED",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::StorageConflict => "STORAGE_CONFLICT",
            Self::InternalFailure(_) => "INTERNAL_ERROR",
        }
    }

    /// Form shown to unauthenticated callers: a malformed code is
    /// reported exactly like an unknown one.
    pub fn concealed(self) -> Self {
        match self {
            Self::MalformedCode => Self::NotFound,
            other => other,
        }
    }
}

impl From<AppError> for KeyError {
    fn from(err: AppError) -> Self {
        Self::InternalFailure(err)
    }
}

impl From<KeyError> for AppError {
    fn from(err: KeyError) -> Self {
        let code = err.code();
        let kind = match &err {
            KeyError::MalformedCode => ErrorKind::Validation,
            KeyError::NotFound => ErrorKind::NotFound,
            KeyError::Revoked | KeyError::Expired | KeyError::QuotaExceeded => ErrorKind::License,
            KeyError::Unauthorized => ErrorKind::Authentication,
            KeyError::StorageConflict => ErrorKind::Conflict,
            KeyError::InternalFailure(_) => ErrorKind::Internal,
        };
        match err {
            KeyError::InternalFailure(inner) => inner.with_code(code),
            other => AppError::new(kind, other.to_string()).with_code(code),
        }
    }
}
