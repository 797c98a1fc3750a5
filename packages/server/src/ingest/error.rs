use common::storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

/// Reasons an upload is refused before anything is durably stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Missing 'file' field")]
    NoFile,
    #[error("File field must have a filename")]
    EmptyName,
    #[error("File extension is not allowed")]
    ExtensionNotAllowed,
    #[error("File content type {mime} is not allowed")]
    MimeNotAllowed { mime: String },
    #[error("Upload could not be read: {0}")]
    Malformed(String),
}

impl UploadRejection {
    /// Machine-readable reason code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoFile => "no_file",
            Self::EmptyName => "empty_name",
            Self::ExtensionNotAllowed => "extension_not_allowed",
            Self::MimeNotAllowed { .. } => "mime_not_allowed",
            Self::Malformed(_) => "malformed_upload",
        }
    }
}

/// Errors produced by [`super::UploadService`].
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Rejected(#[from] UploadRejection),
    #[error("file exceeds the configured size limit")]
    TooLarge,
    #[error("upload not found")]
    NotFound,
    #[error("upload belongs to another user")]
    Forbidden,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("upload task failed: {0}")]
    Task(String),
}
