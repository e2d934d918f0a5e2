use utoipa::{Modify, OpenApi};

use crate::features::businesses::{dtos as businesses_dtos, handlers as businesses_handlers};
use crate::features::health::{dtos as health_dtos, handlers as health_handlers};
use crate::features::reports::{dtos as reports_dtos, handlers as reports_handlers};
use crate::shared::types::{ErrorBody, FieldIssue, PageMeta, PaginatedResponse, ValidationErrorBody};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health_handlers::root,
        health_handlers::health_check,
        // Businesses
        businesses_handlers::create_business,
        businesses_handlers::list_businesses,
        businesses_handlers::get_business,
        // Reports
        reports_handlers::create_report,
        reports_handlers::list_reports,
        reports_handlers::list_reports_by_business,
    ),
    components(
        schemas(
            // Shared
            ErrorBody,
            FieldIssue,
            ValidationErrorBody,
            PageMeta,
            // Health
            health_dtos::HealthResponseDto,
            health_dtos::RootResponseDto,
            // Businesses
            businesses_dtos::CreateBusinessDto,
            businesses_dtos::BusinessResponseDto,
            PaginatedResponse<businesses_dtos::BusinessResponseDto>,
            // Reports
            reports_dtos::CreateReportMultipart,
            reports_dtos::ReportResponseDto,
            PaginatedResponse<reports_dtos::ReportResponseDto>,
        )
    ),
    tags(
        (name = "health", description = "Liveness and store connectivity"),
        (name = "businesses", description = "Businesses tracked by the platform"),
        (name = "reports", description = "Daily business reports with photo/video evidence"),
    ),
    info(
        title = "OvaSight API",
        version = "0.1.0",
        description = "Business daily reporting API",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
