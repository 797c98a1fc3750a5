use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::entity::upload;
use crate::ingest::ListParams;

/// Response body for a newly stored upload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadCreatedResponse {
    #[schema(example = 1)]
    pub id: i32,
    /// Original filename as uploaded.
    #[schema(example = "Informe Q3.pdf")]
    pub name: String,
    /// Size in bytes.
    #[schema(example = 48213)]
    pub size: i64,
    /// MIME type detected from the content.
    #[schema(example = "application/pdf")]
    pub mime: String,
    /// Hex SHA-256 of the content.
    #[schema(example = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08")]
    pub sha256: String,
}

impl From<upload::Model> for UploadCreatedResponse {
    fn from(model: upload::Model) -> Self {
        Self {
            id: model.id,
            name: model.original_name,
            size: model.size,
            mime: model.mime,
            sha256: model.sha256,
        }
    }
}

/// Response body when the caller already owns identical content.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DuplicateResponse {
    /// Id of the existing record.
    #[schema(example = 1)]
    pub duplicate_of: i32,
}

/// File summary for list views.
#[derive(Debug, Clone, Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct FileListItem {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Informe Q3.pdf")]
    pub original_name: String,
    #[schema(example = 48213)]
    pub size: i64,
    #[schema(example = "application/pdf")]
    pub mime: String,
    pub created_at: DateTime<Utc>,
}

/// Paging and query echo for a file listing.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListMeta {
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 20)]
    pub per_page: u64,
    /// Matching files across all pages.
    #[schema(example = 47)]
    pub total: u64,
    #[schema(example = 3)]
    pub pages: u64,
    /// Effective sort field.
    #[schema(example = "created_at")]
    pub sort: &'static str,
    /// Effective sort direction.
    #[schema(example = "desc")]
    pub order: &'static str,
    /// Search term, if any.
    pub q: Option<String>,
}

impl FileListMeta {
    pub fn new(params: &ListParams, total: u64, pages: u64) -> Self {
        Self {
            page: params.page,
            per_page: params.per_page,
            total,
            pages,
            sort: params.sort.as_str(),
            order: params.order.as_str(),
            q: params.q.clone(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub items: Vec<FileListItem>,
    pub meta: FileListMeta,
}

/// Query parameters for file listing.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct FileListQuery {
    /// Page number (1-indexed).
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Items per page (1-100, default 20).
    #[param(example = 20)]
    pub per_page: Option<u64>,
    /// Case-insensitive substring of the file name or MIME type.
    #[param(example = "informe")]
    pub q: Option<String>,
    /// Sort field: `created_at` (default), `original_name`, `size`, `mime`.
    #[param(example = "created_at")]
    pub sort: Option<String>,
    /// Sort direction: `asc` or `desc` (default).
    #[param(example = "desc")]
    pub order: Option<String>,
}

impl FileListQuery {
    pub fn into_params(self) -> ListParams {
        ListParams::from_raw(
            self.page,
            self.per_page,
            self.q.as_deref(),
            self.sort.as_deref(),
            self.order.as_deref(),
        )
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OkResponse {
    #[schema(example = true)]
    pub ok: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = true)]
    pub ok: bool,
    #[schema(example = "SPM")]
    pub app: &'static str,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LivenessResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
}

/// Longest field value kept from a client log entry, in bytes.
pub const CLIENT_LOG_FIELD_MAX: usize = 2048;

/// Diagnostic entry reported by the browser client. Every field is optional.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct ClientLogEntry {
    /// Page that produced the entry.
    #[schema(example = "home.html")]
    pub page: Option<String>,
    #[schema(example = "Upload failed")]
    pub message: Option<String>,
    pub stack: Option<String>,
    #[schema(example = "http://127.0.0.1:5001/home.html")]
    pub href: Option<String>,
    #[serde(rename = "userAgent")]
    pub user_agent: Option<String>,
}

impl ClientLogEntry {
    /// Pick the known fields out of an arbitrary JSON value. Non-string
    /// values are kept in their JSON form; everything is truncated to
    /// [`CLIENT_LOG_FIELD_MAX`] bytes.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let field = |name: &str| {
            value.get(name).and_then(|v| match v {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(truncate(s, CLIENT_LOG_FIELD_MAX)),
                other => Some(truncate(&other.to_string(), CLIENT_LOG_FIELD_MAX)),
            })
        };

        Self {
            page: field("page"),
            message: field("message"),
            stack: field("stack"),
            href: field("href"),
            user_agent: field("userAgent"),
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
