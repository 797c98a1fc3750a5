use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

use crate::ingest::{UploadError, UploadRejection};

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `no_file`, `empty_name`,
    /// `extension_not_allowed`, `mime_not_allowed`, `malformed_upload`,
    /// `unauthorized`, `forbidden`, `not_found`, `too_large`, `internal_error`.
    #[schema(example = "extension_not_allowed")]
    pub error: &'static str,
    /// Human-readable error description.
    #[schema(example = "File extension is not allowed")]
    pub message: String,
    /// Sniffed MIME type, present only for `mime_not_allowed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "application/x-executable")]
    pub mime: Option<String>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Upload refused before anything was stored.
    Rejected(UploadRejection),
    Unauthorized,
    Forbidden,
    NotFound(String),
    PayloadTooLarge,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Rejected(rejection) => {
                let mime = match &rejection {
                    UploadRejection::MimeNotAllowed { mime } => Some(mime.clone()),
                    _ => None,
                };
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        error: rejection.code(),
                        message: rejection.to_string(),
                        mime,
                    },
                )
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "unauthorized",
                    message: "Authentication required".into(),
                    mime: None,
                },
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: "forbidden",
                    message: "Insufficient permissions".into(),
                    mime: None,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "not_found",
                    message: msg,
                    mime: None,
                },
            ),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    error: "too_large",
                    message: "File exceeds the maximum allowed size".into(),
                    mime: None,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "internal_error",
                        message: "An unexpected error occurred".into(),
                        mime: None,
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<UploadRejection> for AppError {
    fn from(rejection: UploadRejection) -> Self {
        AppError::Rejected(rejection)
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Rejected(rejection) => AppError::Rejected(rejection),
            UploadError::TooLarge => AppError::PayloadTooLarge,
            UploadError::NotFound => AppError::NotFound("File not found".into()),
            UploadError::Forbidden => AppError::Forbidden,
            UploadError::Storage(e) if e.is_source_too_large() => AppError::PayloadTooLarge,
            UploadError::Storage(common::storage::StorageError::Source(e)) => {
                tracing::debug!("Upload stream failed: {e}");
                AppError::Rejected(UploadRejection::Malformed(e.to_string()))
            }
            UploadError::Storage(e) => AppError::Internal(e.to_string()),
            UploadError::Database(e) => AppError::Internal(e.to_string()),
            UploadError::Task(detail) => AppError::Internal(detail),
        }
    }
}
