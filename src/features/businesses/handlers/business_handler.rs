use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::businesses::dtos::{BusinessResponseDto, CreateBusinessDto};
use crate::features::businesses::services::BusinessService;
use crate::shared::constants::INVALID_BUSINESS_ID_MESSAGE;
use crate::shared::types::{ErrorBody, PaginatedResponse, PaginationQuery, ValidationErrorBody};
use crate::shared::validation::{issues_from, parse_id};

/// Register a business
#[utoipa::path(
    post,
    path = "/api/businesses",
    request_body = CreateBusinessDto,
    responses(
        (status = 201, description = "Business created", body = BusinessResponseDto),
        (status = 400, description = "Validation error", body = ValidationErrorBody),
        (status = 429, description = "Too many creation requests from this client")
    ),
    tag = "businesses"
)]
pub async fn create_business(
    State(service): State<Arc<BusinessService>>,
    AppJson(dto): AppJson<CreateBusinessDto>,
) -> Result<(StatusCode, Json<BusinessResponseDto>)> {
    let dto = dto.trimmed();
    dto.validate()
        .map_err(|e| AppError::Validation(issues_from(&e)))?;

    let business = service.create(dto).await?;
    Ok((StatusCode::CREATED, Json(business)))
}

/// List businesses, newest first
#[utoipa::path(
    get,
    path = "/api/businesses",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of businesses", body = PaginatedResponse<BusinessResponseDto>)
    ),
    tag = "businesses"
)]
pub async fn list_businesses(
    State(service): State<Arc<BusinessService>>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<BusinessResponseDto>>> {
    let page = service.list(query.resolve()).await?;
    Ok(Json(page))
}

/// Get a business by id
#[utoipa::path(
    get,
    path = "/api/businesses/{id}",
    params(
        ("id" = i64, Path, description = "Business id")
    ),
    responses(
        (status = 200, description = "Business found", body = BusinessResponseDto),
        (status = 400, description = "Id is not an integer", body = ErrorBody),
        (status = 404, description = "Business not found", body = ErrorBody)
    ),
    tag = "businesses"
)]
pub async fn get_business(
    State(service): State<Arc<BusinessService>>,
    Path(id): Path<String>,
) -> Result<Json<BusinessResponseDto>> {
    let id = parse_id(&id)
        .ok_or_else(|| AppError::BadRequest(INVALID_BUSINESS_ID_MESSAGE.to_string()))?;

    let business = service.get(id).await?;
    Ok(Json(business))
}
