//! HTTP application assembly shared by the binary and the tests

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::{AppConfig, SwaggerConfig};
use crate::core::error::AppError;
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::rate_limit::{rate_limit_middleware, Policy, RateLimitState, RateLimiter};
use crate::features::businesses::{routes as businesses_routes, BusinessService};
use crate::features::health::{routes as health_routes, HealthService};
use crate::features::reports::{routes as reports_routes, ReportService};

/// Everything the router hands to its handlers
pub struct AppServices {
    pub businesses: Arc<BusinessService>,
    pub reports: Arc<ReportService>,
    pub health: Arc<HealthService>,
    pub rate_limiter: Arc<RateLimiter>,
}

fn swagger_routes(config: &SwaggerConfig) -> Router {
    let swagger_modifier = SwaggerInfoModifier {
        title: config.title.clone(),
        version: config.version.clone(),
        description: config.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger =
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    if let Some(credentials) = config.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        swagger.layer(from_fn(middleware::basic_auth_middleware(Arc::new(
            credentials,
        ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        swagger
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

pub fn build_router(services: AppServices, app: &AppConfig, swagger: &SwaggerConfig) -> Router {
    let limiter = services.rate_limiter;

    // Every /api route passes the general limit before any route-specific one
    let api_routes = Router::new()
        .merge(businesses_routes::routes(
            services.businesses,
            Arc::clone(&limiter),
        ))
        .merge(reports_routes::routes(services.reports, Arc::clone(&limiter)))
        .layer(from_fn_with_state(
            RateLimitState::new(limiter, Policy::Api),
            rate_limit_middleware,
        ));

    let router = Router::new()
        .merge(swagger_routes(swagger))
        .merge(api_routes)
        .merge(health_routes::routes(services.health))
        .fallback(not_found);

    middleware::with_security_headers(router)
        .layer(DefaultBodyLimit::max(app.max_request_body_size))
        .layer(middleware::cors_layer(app.cors_allowed_origins.clone()))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}
