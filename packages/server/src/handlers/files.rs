use std::io;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, body::Body};
use futures::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::ingest::{UploadOutcome, UploadRejection};
use crate::models::files::{
    DuplicateResponse, FileListMeta, FileListQuery, FileListResponse, OkResponse,
    UploadCreatedResponse,
};
use crate::state::AppState;
use crate::utils::filename::content_disposition_value;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// Transport limit for file routes. Leaves room above the per-file maximum
/// so oversize files are reported by the ingestion pipeline.
pub fn files_body_limit(max_file_size: u64) -> DefaultBodyLimit {
    let limit = max_file_size.saturating_add(1024 * 1024);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/api/files",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Stores the multipart field `file` for the caller. The content type is detected \
        from the bytes, not from the client. Uploading content the caller already owns returns \
        `200` with the existing record id instead of storing it again.",
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 201, description = "File stored", body = UploadCreatedResponse),
        (status = 200, description = "Identical content already stored", body = DuplicateResponse),
        (status = 400, description = "Rejected (no_file, empty_name, extension_not_allowed, mime_not_allowed, malformed_upload)", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 413, description = "File too large (too_large)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(owner = %auth_user.identity))]
pub async fn upload_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Upload is not a multipart body: {}", e);
        UploadRejection::NoFile
    })?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // Parts without a filename are plain form values, not files.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let mut reader = StreamReader::new(Box::pin(field.map_err(stream_error)));

        let outcome = state
            .uploads()
            .upload(&auth_user.identity, &filename, &mut reader)
            .await?;

        let response = match outcome {
            UploadOutcome::Created(model) => (
                StatusCode::CREATED,
                Json(UploadCreatedResponse::from(model)),
            )
                .into_response(),
            UploadOutcome::Duplicate { id } => {
                (StatusCode::OK, Json(DuplicateResponse { duplicate_of: id })).into_response()
            }
        };
        return Ok(response);
    }

    Err(UploadRejection::NoFile.into())
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        debug!("Malformed multipart body: {}", e);
        UploadRejection::Malformed(e.body_text()).into()
    }
}

fn stream_error(e: MultipartError) -> io::Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        io::Error::new(io::ErrorKind::FileTooLarge, e)
    } else {
        io::Error::other(e)
    }
}

#[utoipa::path(
    get,
    path = "/api/files",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List the caller's files",
    description = "Paginated, optionally filtered by a case-insensitive substring of the file name \
        or MIME type. Unknown `sort` or `order` values fall back to `created_at` / `desc`.",
    params(FileListQuery),
    responses(
        (status = 200, description = "Page of files", body = FileListResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner = %auth_user.identity))]
pub async fn list_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<FileListQuery>,
) -> Result<Json<FileListResponse>, AppError> {
    let params = query.into_params();
    let page = state.uploads().list(&auth_user.identity, &params).await?;

    Ok(Json(FileListResponse {
        meta: FileListMeta::new(&params, page.total, page.pages),
        items: page.items,
    }))
}

#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a file",
    description = "Streams the stored content as an attachment named after the original upload. \
        Supports conditional requests via `If-None-Match`.",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 304, description = "Not modified"),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Owned by another user", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, headers), fields(owner = %auth_user.identity))]
pub async fn download_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let uploads = state.uploads();
    let record = uploads.get(&auth_user.identity, id).await?;

    let etag_value = format!("\"{}\"", record.sha256);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let reader = uploads.open(&record).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &record.mime)
        .header(header::CONTENT_LENGTH, record.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&record.original_name),
        )
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Removes the stored content and its record. A file already missing from \
        storage does not block the delete.",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File deleted", body = OkResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Owned by another user", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner = %auth_user.identity))]
pub async fn delete_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OkResponse>, AppError> {
    state.uploads().delete(&auth_user.identity, id).await?;
    Ok(Json(OkResponse { ok: true }))
}
