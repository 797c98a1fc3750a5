use axum::Json;

use crate::models::files::{HealthResponse, LivenessResponse};

/// Name reported by the API health check.
pub const APP_NAME: &str = "SPM";

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    operation_id = "apiHealth",
    summary = "API health check",
    responses((status = 200, description = "API is up", body = HealthResponse)),
)]
pub async fn api_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        app: APP_NAME,
    })
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "Health",
    operation_id = "liveness",
    summary = "Liveness probe",
    responses((status = 200, description = "Process is alive", body = LivenessResponse)),
)]
pub async fn healthz() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "ok" })
}
