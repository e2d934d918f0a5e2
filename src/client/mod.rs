//! Client data layer for the reporting API.
//!
//! [`ApiClient`] performs the HTTP calls. [`QueryCache`] keeps the list pages
//! a session has loaded, and [`OptimisticUpdate`] shows a created record in
//! those pages before the server confirms it.

mod api_client;
mod cache;
mod optimistic;

pub use api_client::{
    ApiClient, Business, ClientError, ClientResult, MediaFile, Report, ReportSubmission,
};
pub use cache::{CacheSnapshot, CachedRecord, PageSet, QueryCache, QueryKey};
pub use optimistic::{pending_business, pending_report, OptimisticUpdate};
