use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};

use crate::core::rate_limit::{rate_limit_middleware, Policy, RateLimitState, RateLimiter};
use crate::core::upload::MediaUploader;
use crate::features::reports::handlers;
use crate::features::reports::services::{ReportService, REPORT_MEDIA_FIELDS};

/// Create routes for the reports feature
///
/// Submission is limited by the `upload` policy and accepts bodies large
/// enough for both media fields at their ceilings.
pub fn routes(service: Arc<ReportService>, limiter: Arc<RateLimiter>) -> Router {
    let upload_limit = from_fn_with_state(
        RateLimitState::new(limiter, Policy::Upload),
        rate_limit_middleware,
    );
    let body_limit = DefaultBodyLimit::max(MediaUploader::max_body_size(REPORT_MEDIA_FIELDS));

    Router::new()
        .route(
            "/api/reports",
            get(handlers::list_reports)
                .post(handlers::create_report.layer(body_limit).layer(upload_limit)),
        )
        .route(
            "/api/reports/business/{businessId}",
            get(handlers::list_reports_by_business),
        )
        .with_state(service)
}
