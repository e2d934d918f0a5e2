use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::health::handlers;
use crate::features::health::services::HealthService;

/// Health routes live outside `/api` and are not rate limited
pub fn routes(service: Arc<HealthService>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .with_state(service)
}
