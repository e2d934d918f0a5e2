use std::sync::Arc;

use axum::{
    handler::Handler,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};

use crate::core::rate_limit::{rate_limit_middleware, Policy, RateLimitState, RateLimiter};
use crate::features::businesses::handlers;
use crate::features::businesses::services::BusinessService;

/// Create routes for the businesses feature
///
/// Creation is additionally limited by the `create` policy.
pub fn routes(service: Arc<BusinessService>, limiter: Arc<RateLimiter>) -> Router {
    let create_limit = from_fn_with_state(
        RateLimitState::new(limiter, Policy::Create),
        rate_limit_middleware,
    );

    Router::new()
        .route(
            "/api/businesses",
            get(handlers::list_businesses).post(handlers::create_business.layer(create_limit)),
        )
        .route("/api/businesses/{id}", get(handlers::get_business))
        .with_state(service)
}
