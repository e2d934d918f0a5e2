use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{NewReport, Report, ReportWithBusiness, ReportWithBusinessRow};
use crate::shared::constants::BUSINESS_NOT_FOUND_MESSAGE;
use crate::shared::types::Pagination;

/// Persistence for reports
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Insert one report. An unknown business is a `BadRequest`.
    async fn insert(&self, report: &NewReport) -> Result<Report>;

    /// One page of all reports with their business, newest first
    async fn list_with_business(&self, pagination: Pagination) -> Result<Vec<ReportWithBusiness>>;

    async fn count(&self) -> Result<i64>;

    /// One page of a business's reports, newest first
    async fn list_by_business(&self, business_id: i64, pagination: Pagination) -> Result<Vec<Report>>;

    async fn count_by_business(&self, business_id: i64) -> Result<i64>;
}

const REPORT_COLUMNS: &str = "id, sales, expenses, customer_count, notes, image_url, video_url, \
                              business_id, created_at";

pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn insert(&self, report: &NewReport) -> Result<Report> {
        let sql = format!(
            r#"
            INSERT INTO reports (sales, expenses, customer_count, notes, image_url, video_url, business_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );

        sqlx::query_as::<_, Report>(&sql)
            .bind(report.sales)
            .bind(report.expenses)
            .bind(report.customer_count)
            .bind(&report.notes)
            .bind(&report.image_url)
            .bind(&report.video_url)
            .bind(report.business_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    tracing::debug!(
                        "Report rejected, business {} does not exist",
                        report.business_id
                    );
                    AppError::BadRequest(BUSINESS_NOT_FOUND_MESSAGE.to_string())
                }
                e => {
                    tracing::error!("Failed to create report: {:?}", e);
                    AppError::Database(e)
                }
            })
    }

    async fn list_with_business(&self, pagination: Pagination) -> Result<Vec<ReportWithBusiness>> {
        let rows = sqlx::query_as::<_, ReportWithBusinessRow>(
            r#"
            SELECT
                r.id, r.sales, r.expenses, r.customer_count, r.notes,
                r.image_url, r.video_url, r.business_id, r.created_at,
                b.name AS business_name,
                b.owner_name AS business_owner_name,
                b.owner_phone AS business_owner_phone,
                b.category AS business_category,
                b.city AS business_city,
                b.created_at AS business_created_at,
                b.updated_at AS business_updated_at
            FROM reports r
            JOIN businesses b ON b.id = r.business_id
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list reports: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count reports: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list_by_business(&self, business_id: i64, pagination: Pagination) -> Result<Vec<Report>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM reports
            WHERE business_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
            REPORT_COLUMNS
        );

        sqlx::query_as::<_, Report>(&sql)
            .bind(business_id)
            .bind(pagination.limit)
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list reports for business {}: {:?}", business_id, e);
                AppError::Database(e)
            })
    }

    async fn count_by_business(&self, business_id: i64) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reports WHERE business_id = $1")
            .bind(business_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count reports for business {}: {:?}", business_id, e);
                AppError::Database(e)
            })
    }
}
