use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppMultipart;
use crate::features::reports::dtos::{CreateReportMultipart, ReportResponseDto};
use crate::features::reports::services::ReportService;
use crate::shared::constants::INVALID_BUSINESS_ID_MESSAGE;
use crate::shared::types::{ErrorBody, PaginatedResponse, PaginationQuery};
use crate::shared::validation::parse_id;

/// Submit a daily report
///
/// The image is required and must be `image/*`; the optional video must be
/// `video/*`. Files are streamed to object storage while the body is read.
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body(content = CreateReportMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Report created", body = ReportResponseDto),
        (status = 400, description = "Missing image, rejected file, unknown business (`error`) or field validation failure (`errors`)", body = ErrorBody),
        (status = 429, description = "Too many upload requests from this client"),
        (status = 500, description = "Storage or database failure", body = ErrorBody)
    ),
    tag = "reports"
)]
pub async fn create_report(
    State(service): State<Arc<ReportService>>,
    AppMultipart(multipart): AppMultipart,
) -> Result<(StatusCode, Json<ReportResponseDto>)> {
    let report = service.create(multipart).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// List all reports, newest first, each with its business
#[utoipa::path(
    get,
    path = "/api/reports",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of reports", body = PaginatedResponse<ReportResponseDto>)
    ),
    tag = "reports"
)]
pub async fn list_reports(
    State(service): State<Arc<ReportService>>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<ReportResponseDto>>> {
    let page = service.list(query.resolve()).await?;
    Ok(Json(page))
}

/// List the reports of one business, newest first
#[utoipa::path(
    get,
    path = "/api/reports/business/{businessId}",
    params(
        ("businessId" = i64, Path, description = "Business id"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Page of reports", body = PaginatedResponse<ReportResponseDto>),
        (status = 400, description = "Id is not an integer", body = ErrorBody)
    ),
    tag = "reports"
)]
pub async fn list_reports_by_business(
    State(service): State<Arc<ReportService>>,
    Path(business_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<ReportResponseDto>>> {
    let business_id = parse_id(&business_id)
        .ok_or_else(|| AppError::BadRequest(INVALID_BUSINESS_ID_MESSAGE.to_string()))?;

    let page = service
        .list_by_business(business_id, query.resolve())
        .await?;
    Ok(Json(page))
}
