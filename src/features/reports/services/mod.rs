mod report_service;

pub use report_service::{ReportService, REPORT_MEDIA_FIELDS};
