use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::features::health::dtos::{HealthResponseDto, RootResponseDto};
use crate::features::health::services::HealthService;

/// Liveness message
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running", body = RootResponseDto)
    ),
    tag = "health"
)]
pub async fn root() -> Json<RootResponseDto> {
    Json(RootResponseDto {
        message: "OvaSight API is running".to_string(),
    })
}

/// Check store connectivity
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Store reachable", body = HealthResponseDto),
        (status = 503, description = "Store unreachable", body = HealthResponseDto)
    ),
    tag = "health"
)]
pub async fn health_check(
    State(service): State<Arc<HealthService>>,
) -> (StatusCode, Json<HealthResponseDto>) {
    match service.check().await {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(body) => (StatusCode::SERVICE_UNAVAILABLE, Json(body)),
    }
}
