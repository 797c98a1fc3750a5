use axum::Json;
use axum::body::Bytes;

use crate::models::files::{ClientLogEntry, OkResponse};

#[utoipa::path(
    post,
    path = "/api/client-logs",
    tag = "Diagnostics",
    operation_id = "submitClientLog",
    summary = "Report a client-side error",
    description = "Accepts a diagnostic entry from the browser and writes it to the server log. \
        Missing or malformed bodies are accepted and ignored.",
    request_body(content = ClientLogEntry, description = "Client diagnostic entry"),
    responses((status = 200, description = "Entry accepted", body = OkResponse)),
)]
pub async fn submit_client_log(body: Bytes) -> Json<OkResponse> {
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap_or_default();
    let entry = ClientLogEntry::from_json(&value);

    if entry.message.is_some() || entry.stack.is_some() {
        tracing::warn!(
            target: "client_log",
            page = entry.page.as_deref().unwrap_or("-"),
            href = entry.href.as_deref().unwrap_or("-"),
            user_agent = entry.user_agent.as_deref().unwrap_or("-"),
            stack = entry.stack.as_deref().unwrap_or(""),
            "{}",
            entry.message.as_deref().unwrap_or("")
        );
    } else {
        tracing::debug!(target: "client_log", "Ignoring empty client log entry");
    }

    Json(OkResponse { ok: true })
}
