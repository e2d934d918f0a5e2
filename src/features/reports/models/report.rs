use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::features::businesses::dtos::BusinessResponseDto;
use crate::features::businesses::models::Business;
use crate::features::reports::dtos::ReportResponseDto;

/// Database model for report
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Report {
    pub id: i64,
    pub sales: Decimal,
    pub expenses: Decimal,
    pub customer_count: i32,
    pub notes: Option<String>,
    pub image_url: String,
    pub video_url: Option<String>,
    pub business_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Validated report ready to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub sales: Decimal,
    pub expenses: Decimal,
    pub customer_count: i32,
    pub notes: Option<String>,
    pub image_url: String,
    pub video_url: Option<String>,
    pub business_id: i64,
}

/// Report joined with the business it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWithBusiness {
    pub report: Report,
    pub business: Business,
}

/// Flat row of the report/business join. Business columns are prefixed.
#[derive(Debug, Clone, FromRow)]
pub struct ReportWithBusinessRow {
    #[sqlx(flatten)]
    pub report: Report,
    pub business_name: String,
    pub business_owner_name: String,
    pub business_owner_phone: String,
    pub business_category: String,
    pub business_city: String,
    pub business_created_at: DateTime<Utc>,
    pub business_updated_at: DateTime<Utc>,
}

impl From<ReportWithBusinessRow> for ReportWithBusiness {
    fn from(row: ReportWithBusinessRow) -> Self {
        let business = Business {
            id: row.report.business_id,
            name: row.business_name,
            owner_name: row.business_owner_name,
            owner_phone: row.business_owner_phone,
            category: row.business_category,
            city: row.business_city,
            created_at: row.business_created_at,
            updated_at: row.business_updated_at,
        };
        Self {
            report: row.report,
            business,
        }
    }
}

impl From<Report> for ReportResponseDto {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            sales: r.sales,
            expenses: r.expenses,
            customer_count: r.customer_count,
            notes: r.notes,
            image_url: r.image_url,
            video_url: r.video_url,
            business_id: r.business_id,
            business: None,
            created_at: r.created_at,
        }
    }
}

impl From<ReportWithBusiness> for ReportResponseDto {
    fn from(joined: ReportWithBusiness) -> Self {
        Self {
            business: Some(BusinessResponseDto::from(joined.business)),
            ..Self::from(joined.report)
        }
    }
}
