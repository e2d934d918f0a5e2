//! Daily performance reports submitted by business owners.
//!
//! Each report carries an image (required) and optionally a video. Media is
//! streamed to object storage while the multipart body is parsed; only the
//! resulting locations are persisted.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Rate limit | Description |
//! |--------|----------|------------|-------------|
//! | POST | `/api/reports` | upload (10/15min) | Submit a report (multipart) |
//! | GET | `/api/reports` | - | All reports with their business, newest first |
//! | GET | `/api/reports/business/{businessId}` | - | Reports of one business |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::{PgReportRepository, ReportRepository};
pub use services::{ReportService, REPORT_MEDIA_FIELDS};
