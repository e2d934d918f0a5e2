use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::upload::UploadedForm;
use crate::features::businesses::dtos::BusinessResponseDto;
use crate::shared::types::FieldIssue;
use crate::shared::validation::DECIMAL_REGEX;

/// Largest amount a `NUMERIC(12,2)` column holds
fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Multipart body of a report submission (documentation only)
#[derive(Debug, ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CreateReportMultipart {
    /// Non-negative amount with at most 2 decimals
    #[schema(example = "250.50")]
    pub sales: String,
    #[schema(example = "80.25")]
    pub expenses: String,
    /// Non-negative integer
    #[schema(example = "34")]
    pub customer_count: String,
    #[schema(example = "1")]
    pub business_id: String,
    pub notes: Option<String>,
    /// Required evidence photo, image/*, at most 5,000,000 bytes
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
    /// Optional video, video/*, at most 50,000,000 bytes
    #[schema(value_type = Option<String>, format = Binary)]
    pub video: Option<Vec<u8>>,
}

/// Text fields of a report submission as sent by the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateReportForm {
    pub sales: Option<String>,
    pub expenses: Option<String>,
    pub customer_count: Option<String>,
    pub business_id: Option<String>,
    pub notes: Option<String>,
}

impl CreateReportForm {
    pub fn from_upload(form: &UploadedForm) -> Self {
        let text = |name: &str| form.text(name).map(str::to_string);
        Self {
            sales: text("sales"),
            expenses: text("expenses"),
            customer_count: text("customerCount"),
            business_id: text("businessId"),
            notes: text("notes"),
        }
    }
}

/// Report fields after coercion and validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportInput {
    /// Scale 2
    pub sales: Decimal,
    /// Scale 2
    pub expenses: Decimal,
    pub customer_count: i32,
    pub business_id: i64,
    pub notes: Option<String>,
}

impl TryFrom<CreateReportForm> for ReportInput {
    type Error = Vec<FieldIssue>;

    fn try_from(form: CreateReportForm) -> Result<Self, Self::Error> {
        let mut issues = Vec::new();

        let sales = parse_amount("sales", "Sales", form.sales.as_deref(), &mut issues);
        let expenses = parse_amount("expenses", "Expenses", form.expenses.as_deref(), &mut issues);
        let customer_count = parse_whole(
            "customerCount",
            "Customer count",
            form.customer_count.as_deref(),
            &mut issues,
        )
        .and_then(|n| {
            if n < 0 {
                issues.push(FieldIssue::new(
                    "customerCount",
                    "min",
                    "Customer count must be greater than or equal to 0",
                ));
                return None;
            }
            i32::try_from(n).ok().or_else(|| {
                issues.push(FieldIssue::new(
                    "customerCount",
                    "max",
                    format!("Customer count must not exceed {}", i32::MAX),
                ));
                None
            })
        });
        let business_id = parse_whole(
            "businessId",
            "Business id",
            form.business_id.as_deref(),
            &mut issues,
        );

        match (sales, expenses, customer_count, business_id) {
            (Some(sales), Some(expenses), Some(customer_count), Some(business_id))
                if issues.is_empty() =>
            {
                Ok(Self {
                    sales,
                    expenses,
                    customer_count,
                    business_id,
                    notes: form.notes.filter(|n| !n.is_empty()),
                })
            }
            _ => Err(issues),
        }
    }
}

/// Parse a plain decimal form value, recording an issue when it is not one
fn numeric_text(
    field: &str,
    label: &str,
    raw: Option<&str>,
    issues: &mut Vec<FieldIssue>,
) -> Option<Decimal> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        issues.push(FieldIssue::new(field, "required", format!("{} is required", label)));
        return None;
    };

    if !DECIMAL_REGEX.is_match(raw) {
        issues.push(FieldIssue::new(
            field,
            "invalid_type",
            format!("{} must be a number", label),
        ));
        return None;
    }

    let (negative, digits) = match raw.as_bytes()[0] {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };
    let digits = digits.strip_suffix('.').unwrap_or(digits);
    let digits = if digits.starts_with('.') {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };

    match Decimal::from_str(&digits) {
        Ok(value) if negative => Some(-value),
        Ok(value) => Some(value),
        Err(_) => {
            issues.push(FieldIssue::new(
                field,
                "max",
                format!("{} is too large", label),
            ));
            None
        }
    }
}

fn parse_amount(
    field: &str,
    label: &str,
    raw: Option<&str>,
    issues: &mut Vec<FieldIssue>,
) -> Option<Decimal> {
    let mut value = numeric_text(field, label, raw, issues)?;

    if value.is_sign_negative() && !value.is_zero() {
        issues.push(FieldIssue::new(
            field,
            "min",
            format!("{} must be greater than or equal to 0", label),
        ));
        return None;
    }
    if value.normalize().scale() > 2 {
        issues.push(FieldIssue::new(
            field,
            "scale",
            format!("{} must have at most 2 decimal places", label),
        ));
        return None;
    }
    if value > max_amount() {
        issues.push(FieldIssue::new(
            field,
            "max",
            format!("{} must not exceed {}", label, max_amount()),
        ));
        return None;
    }

    value.rescale(2);
    Some(value.abs())
}

fn parse_whole(
    field: &str,
    label: &str,
    raw: Option<&str>,
    issues: &mut Vec<FieldIssue>,
) -> Option<i64> {
    let value = numeric_text(field, label, raw, issues)?;

    if !value.fract().is_zero() {
        issues.push(FieldIssue::new(
            field,
            "integer",
            format!("{} must be an integer", label),
        ));
        return None;
    }

    value.trunc().to_i64().or_else(|| {
        issues.push(FieldIssue::new(
            field,
            "max",
            format!("{} is too large", label),
        ));
        None
    })
}

/// Response DTO for report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponseDto {
    pub id: i64,
    /// Exact decimal rendered as a string, e.g. "250.50"
    #[schema(value_type = String, example = "250.50")]
    pub sales: Decimal,
    #[schema(value_type = String, example = "80.25")]
    pub expenses: Decimal,
    pub customer_count: i32,
    pub notes: Option<String>,
    pub image_url: String,
    pub video_url: Option<String>,
    pub business_id: i64,
    /// Present on the all-reports listing only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessResponseDto>,
    pub created_at: DateTime<Utc>,
}

impl ReportResponseDto {
    /// Sales minus expenses, exact
    pub fn profit(&self) -> Decimal {
        self.sales - self.expenses
    }
}
