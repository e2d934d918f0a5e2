use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::features::businesses::dtos::{BusinessResponseDto, CreateBusinessDto};
use crate::features::reports::dtos::ReportResponseDto;
use crate::shared::types::PaginatedResponse;

pub type Business = BusinessResponseDto;
pub type Report = ReportResponseDto;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx reply; `message` is what the server said, verbatim
    #[error("{message}")]
    Api { status: StatusCode, message: String },
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// File attached to a report submission
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Report as entered by an owner, before the server assigns id and locations
#[derive(Debug, Clone)]
pub struct ReportSubmission {
    pub business_id: i64,
    pub sales: Decimal,
    pub expenses: Decimal,
    pub customer_count: i32,
    pub notes: Option<String>,
    pub image: MediaFile,
    pub video: Option<MediaFile>,
}

/// Server error bodies, either `{error}` or `{errors: [...]}`
#[derive(Debug, Deserialize)]
struct ErrorReply {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorIssue>,
}

#[derive(Debug, Deserialize)]
struct ErrorIssue {
    message: String,
}

/// Typed client for the reporting API
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn create_business(&self, dto: &CreateBusinessDto) -> ClientResult<Business> {
        let response = self
            .http_client
            .post(self.url("/api/businesses"))
            .json(dto)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn list_businesses(
        &self,
        page: i64,
        limit: i64,
    ) -> ClientResult<PaginatedResponse<Business>> {
        self.get_page("/api/businesses", page, limit).await
    }

    pub async fn get_business(&self, id: i64) -> ClientResult<Business> {
        let response = self
            .http_client
            .get(self.url(&format!("/api/businesses/{}", id)))
            .send()
            .await?;
        read_json(response).await
    }

    /// Submit a report as multipart, attaching notes and video only when present
    pub async fn create_report(&self, submission: ReportSubmission) -> ClientResult<Report> {
        let mut form = Form::new()
            .text("sales", submission.sales.to_string())
            .text("expenses", submission.expenses.to_string())
            .text("customerCount", submission.customer_count.to_string())
            .text("businessId", submission.business_id.to_string())
            .part("image", media_part(submission.image)?);

        if let Some(notes) = submission.notes.filter(|n| !n.is_empty()) {
            form = form.text("notes", notes);
        }
        if let Some(video) = submission.video {
            form = form.part("video", media_part(video)?);
        }

        let response = self
            .http_client
            .post(self.url("/api/reports"))
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn list_reports(&self, page: i64, limit: i64) -> ClientResult<PaginatedResponse<Report>> {
        self.get_page("/api/reports", page, limit).await
    }

    pub async fn list_reports_by_business(
        &self,
        business_id: i64,
        page: i64,
        limit: i64,
    ) -> ClientResult<PaginatedResponse<Report>> {
        self.get_page(&format!("/api/reports/business/{}", business_id), page, limit)
            .await
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: i64,
        limit: i64,
    ) -> ClientResult<PaginatedResponse<T>> {
        let response = self
            .http_client
            .get(self.url(path))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        read_json(response).await
    }
}

fn media_part(file: MediaFile) -> ClientResult<Part> {
    Ok(Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str(&file.content_type)?)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!("API error: HTTP {} - {}", status, body);

    Err(ClientError::Api {
        status,
        message: error_message(status, &body),
    })
}

/// The `error` text, the joined `errors` messages, or the raw body
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(reply) = serde_json::from_str::<ErrorReply>(body) {
        if let Some(error) = reply.error {
            return error;
        }
        if !reply.errors.is_empty() {
            return reply
                .errors
                .into_iter()
                .map(|issue| issue.message)
                .collect::<Vec<_>>()
                .join("; ");
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
