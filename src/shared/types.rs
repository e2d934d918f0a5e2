use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::shared::validation::parse_leading_int;

// =============================================================================
// ERROR BODIES
// =============================================================================

/// Body of every single-message failure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// One failed validation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldIssue {
    /// Request field name as sent by the client (camelCase)
    pub field: String,
    /// Machine readable rule name, e.g. `required`, `min`, `integer`
    pub code: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Body of a 400 caused by field validation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorBody {
    pub errors: Vec<FieldIssue>,
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Raw pagination query parameters shared by all list endpoints.
///
/// Values are kept as strings so that garbage input falls back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Page number (1-indexed, default: 1)
    #[param(value_type = Option<i64>, minimum = 1)]
    pub page: Option<String>,

    /// Number of items per page (default: 10, max: 100)
    #[param(value_type = Option<i64>, minimum = 1, maximum = 100)]
    pub limit: Option<String>,
}

/// Resolved page request, always `page >= 1` and `1 <= limit <= MAX_PAGE_SIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationQuery {
    pub fn resolve(&self) -> Pagination {
        let page = self
            .page
            .as_deref()
            .and_then(parse_leading_int)
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        let limit = self
            .limit
            .as_deref()
            .and_then(parse_leading_int)
            .filter(|l| *l >= 1)
            .map(|l| l.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Pagination { page, limit }
    }
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// SQL OFFSET for this page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Paging metadata of a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Count of all matching rows
    pub total: i64,
    /// 1-based current page
    pub page: i64,
    /// Page size
    pub limit: i64,
    /// ceil(total / limit)
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(total: i64, pagination: Pagination) -> Self {
        let total = total.max(0);
        let limit = pagination.limit.max(1);
        Self {
            total,
            page: pagination.page,
            limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// Envelope returned by every list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    /// Rows of the current page, newest first
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            data,
            meta: PageMeta::new(total, pagination),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> PaginationQuery {
        PaginationQuery {
            page: page.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn test_resolve_defaults() {
        assert_eq!(query(None, None).resolve(), Pagination { page: 1, limit: 10 });
        assert_eq!(
            query(Some("abc"), Some("")).resolve(),
            Pagination { page: 1, limit: 10 }
        );
        assert_eq!(
            query(Some("0"), Some("0")).resolve(),
            Pagination { page: 1, limit: 10 }
        );
        assert_eq!(
            query(Some("-3"), Some("-1")).resolve(),
            Pagination { page: 1, limit: 10 }
        );
    }

    #[test]
    fn test_resolve_parses_leading_digits() {
        assert_eq!(
            query(Some("3"), Some("25")).resolve(),
            Pagination { page: 3, limit: 25 }
        );
        assert_eq!(
            query(Some("2abc"), Some("5.9")).resolve(),
            Pagination { page: 2, limit: 5 }
        );
    }

    #[test]
    fn test_resolve_clamps_limit() {
        assert_eq!(query(None, Some("1000")).resolve().limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_offset() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(3, 10).offset(), 20);
        assert_eq!(Pagination::new(2, 7).offset(), 7);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        for limit in 1..=12 {
            for total in 0..=50 {
                let meta = PageMeta::new(total, Pagination::new(1, limit));
                let expected = (total as f64 / limit as f64).ceil() as i64;
                assert_eq!(meta.total_pages, expected, "total={total} limit={limit}");
            }
        }
    }

    #[test]
    fn test_empty_result_has_zero_pages() {
        for page in 1..5 {
            let response: PaginatedResponse<i32> =
                PaginatedResponse::new(vec![], 0, Pagination::new(page, 10));
            assert!(response.data.is_empty());
            assert_eq!(response.meta.total_pages, 0);
            assert_eq!(response.meta.page, page);
        }
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let meta = PageMeta::new(21, Pagination::new(2, 10));
        let json = serde_json::to_value(meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "total": 21, "page": 2, "limit": 10, "totalPages": 3 })
        );
    }
}
