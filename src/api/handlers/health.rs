use crate::types::HealthResponse;
use axum::Json;

/// Liveness check
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Server is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
