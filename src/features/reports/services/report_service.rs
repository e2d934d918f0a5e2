use std::sync::Arc;

use axum::extract::Multipart;

use crate::core::error::{AppError, Result};
use crate::core::upload::{MediaField, MediaKind, MediaUploader, UploadedForm};
use crate::features::reports::dtos::{CreateReportForm, ReportInput, ReportResponseDto};
use crate::features::reports::models::NewReport;
use crate::features::reports::repositories::ReportRepository;
use crate::modules::storage::ObjectStorage;
use crate::shared::constants::{IMAGE_MAX_BYTES, IMAGE_REQUIRED_MESSAGE, VIDEO_MAX_BYTES};
use crate::shared::types::{PaginatedResponse, Pagination};

/// File fields accepted on report submission
pub const REPORT_MEDIA_FIELDS: &[MediaField] = &[
    MediaField {
        name: "image",
        kind: MediaKind::Image,
        max_bytes: IMAGE_MAX_BYTES,
    },
    MediaField {
        name: "video",
        kind: MediaKind::Video,
        max_bytes: VIDEO_MAX_BYTES,
    },
];

const REPORT_KEY_PREFIX: &str = "reports";

/// Service for submitting and listing reports
pub struct ReportService {
    repository: Arc<dyn ReportRepository>,
    uploader: MediaUploader,
}

impl ReportService {
    pub fn new(repository: Arc<dyn ReportRepository>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            repository,
            uploader: MediaUploader::new(storage, REPORT_MEDIA_FIELDS, REPORT_KEY_PREFIX),
        }
    }

    /// Stream the submission's media to storage, then persist the report.
    ///
    /// Stored media is removed again when the submission is rejected. Once
    /// issued, the insert and the commit or discard of the media run to
    /// completion on their own task even if the request is dropped.
    pub async fn create(&self, multipart: Multipart) -> Result<ReportResponseDto> {
        let form = self.uploader.accept(multipart).await?;

        let new_report = match build_report(&form) {
            Ok(new_report) => new_report,
            Err(e) => {
                form.discard().await;
                return Err(e);
            }
        };

        let repository = Arc::clone(&self.repository);
        let report = tokio::spawn(async move {
            match repository.insert(&new_report).await {
                Ok(report) => {
                    form.commit();
                    Ok(report)
                }
                Err(e) => {
                    form.discard().await;
                    Err(e)
                }
            }
        })
        .await
        .map_err(|e| AppError::Internal(format!("Report insert task failed: {}", e)))??;

        tracing::info!(
            "Report created: id={}, business_id={}, video={}",
            report.id,
            report.business_id,
            report.video_url.is_some()
        );

        Ok(report.into())
    }

    /// All reports with their business, newest first
    pub async fn list(&self, pagination: Pagination) -> Result<PaginatedResponse<ReportResponseDto>> {
        let (reports, total) = tokio::try_join!(
            self.repository.list_with_business(pagination),
            self.repository.count()
        )?;

        Ok(PaginatedResponse::new(reports, total, pagination).map(Into::into))
    }

    /// Reports of one business, newest first. An unknown business yields an empty page.
    pub async fn list_by_business(
        &self,
        business_id: i64,
        pagination: Pagination,
    ) -> Result<PaginatedResponse<ReportResponseDto>> {
        let (reports, total) = tokio::try_join!(
            self.repository.list_by_business(business_id, pagination),
            self.repository.count_by_business(business_id)
        )?;

        Ok(PaginatedResponse::new(reports, total, pagination).map(Into::into))
    }
}

/// Row to insert for an accepted form; the image is mandatory
fn build_report(form: &UploadedForm) -> Result<NewReport> {
    let image = form
        .file("image")
        .ok_or_else(|| AppError::BadRequest(IMAGE_REQUIRED_MESSAGE.to_string()))?;

    let input =
        ReportInput::try_from(CreateReportForm::from_upload(form)).map_err(AppError::Validation)?;

    Ok(NewReport {
        sales: input.sales,
        expenses: input.expenses,
        customer_count: input.customer_count,
        notes: input.notes,
        image_url: image.location.clone(),
        video_url: form.file("video").map(|v| v.location.clone()),
        business_id: input.business_id,
    })
}
