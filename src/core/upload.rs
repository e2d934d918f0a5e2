//! Streaming media upload for multipart requests
//!
//! Reads a multipart body field by field. Text fields are collected; file
//! fields are checked against their [`MediaField`] rule and streamed straight
//! to object storage while they are parsed, with the per-field byte ceiling
//! enforced on the stream itself. The resulting [`UploadedForm`] owns the
//! stored objects until the caller commits it; an uncommitted form deletes
//! them.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use futures::StreamExt;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::modules::storage::ObjectStorage;
use crate::shared::constants::INVALID_FILE_TYPE_MESSAGE;
use crate::shared::validation::MEDIA_TYPE_REGEX;

/// Media family a file field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    fn type_prefix(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/",
            MediaKind::Video => "video/",
        }
    }

    /// Whether a normalized content type belongs to this media family
    pub fn accepts(&self, content_type: &str) -> bool {
        content_type.starts_with(self.type_prefix()) && MEDIA_TYPE_REGEX.is_match(content_type)
    }
}

/// Upload rule for one named file field (at most one file per field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaField {
    pub name: &'static str,
    pub kind: MediaKind,
    pub max_bytes: u64,
}

/// A file that has been written to object storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub field: &'static str,
    pub original_name: Option<String>,
    pub content_type: String,
    pub size: u64,
    pub key: String,
    pub location: String,
}

/// Parsed multipart form whose files already live in object storage
pub struct UploadedForm {
    text: HashMap<String, String>,
    files: Vec<UploadedFile>,
    storage: Arc<dyn ObjectStorage>,
    settled: bool,
}

impl UploadedForm {
    fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            text: HashMap::new(),
            files: Vec::new(),
            storage,
            settled: false,
        }
    }

    /// Value of a text field, if it was sent
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text.get(name).map(String::as_str)
    }

    /// Stored file of a media field, if one was sent
    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == field)
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Keep the stored objects: they are now referenced elsewhere
    pub fn commit(mut self) {
        self.settled = true;
    }

    /// Delete every stored object of this form
    pub async fn discard(mut self) {
        self.settled = true;
        let keys: Vec<String> = std::mem::take(&mut self.files)
            .into_iter()
            .map(|f| f.key)
            .collect();
        remove_objects(self.storage.as_ref(), &keys).await;
    }
}

impl Drop for UploadedForm {
    fn drop(&mut self) {
        if self.settled || self.files.is_empty() {
            return;
        }

        // Dropped without commit or discard: the request was cancelled mid-flight
        let keys: Vec<String> = self.files.iter().map(|f| f.key.clone()).collect();
        let storage = Arc::clone(&self.storage);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    remove_objects(storage.as_ref(), &keys).await;
                });
            }
            Err(_) => warn!("No runtime to clean up abandoned uploads: {:?}", keys),
        }
    }
}

async fn remove_objects(storage: &dyn ObjectStorage, keys: &[String]) {
    for key in keys {
        match storage.delete(key).await {
            Ok(()) => debug!("Removed abandoned upload '{}'", key),
            Err(e) => warn!("Failed to remove abandoned upload '{}': {}", key, e),
        }
    }
}

// Stream outcome flags shared between the byte-counting reader and the uploader
const STREAM_OK: u8 = 0;
const STREAM_TOO_LARGE: u8 = 1;
const STREAM_READ_FAILED: u8 = 2;

/// Streams the media fields of a multipart body to object storage
#[derive(Clone)]
pub struct MediaUploader {
    storage: Arc<dyn ObjectStorage>,
    fields: &'static [MediaField],
    key_prefix: &'static str,
}

impl MediaUploader {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        fields: &'static [MediaField],
        key_prefix: &'static str,
    ) -> Self {
        Self {
            storage,
            fields,
            key_prefix,
        }
    }

    /// Upper bound of a request body carrying every media field at its ceiling
    pub fn max_body_size(fields: &[MediaField]) -> usize {
        let media: u64 = fields.iter().map(|f| f.max_bytes).sum();
        media as usize + 1024 * 1024
    }

    /// Consume the multipart body. On error every file stored so far is deleted.
    pub async fn accept(&self, mut multipart: Multipart) -> Result<UploadedForm> {
        let mut form = UploadedForm::new(Arc::clone(&self.storage));
        match self.read_fields(&mut multipart, &mut form).await {
            Ok(()) => Ok(form),
            Err(e) => {
                form.discard().await;
                Err(e)
            }
        }
    }

    async fn read_fields(&self, multipart: &mut Multipart, form: &mut UploadedForm) -> Result<()> {
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            debug!("Failed to read multipart field: {}", e);
            AppError::BadRequest(format!("Failed to read multipart data: {}", e))
        })? {
            let name = field.name().unwrap_or("").to_string();

            let Some(file_name) = field.file_name().map(str::to_string) else {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
                })?;
                form.text.insert(name, text);
                continue;
            };

            let rule = self
                .fields
                .iter()
                .find(|f| f.name == name)
                .ok_or_else(|| AppError::BadRequest(format!("Unexpected file field: {}", name)))?;

            // Empty file inputs are submitted as a nameless part
            if file_name.is_empty() {
                debug!("Skipping empty file input '{}'", name);
                continue;
            }

            if form.file(rule.name).is_some() {
                return Err(AppError::BadRequest(format!(
                    "Unexpected file field: {}",
                    name
                )));
            }

            let stored = self.store_file(rule, Some(file_name), field).await?;
            form.files.push(stored);
        }

        Ok(())
    }

    async fn store_file(
        &self,
        rule: &MediaField,
        original_name: Option<String>,
        field: Field<'_>,
    ) -> Result<UploadedFile> {
        let content_type = normalize_content_type(field.content_type());
        if !rule.kind.accepts(&content_type) {
            warn!(
                "Rejected upload for field '{}' with content type '{}'",
                rule.name, content_type
            );
            return Err(AppError::BadRequest(INVALID_FILE_TYPE_MESSAGE.to_string()));
        }

        let key = storage_key(
            self.key_prefix,
            rule.name,
            &content_type,
            original_name.as_deref(),
        );

        let received = Arc::new(AtomicU64::new(0));
        let outcome = Arc::new(AtomicU8::new(STREAM_OK));
        let limit = rule.max_bytes;

        let stream = {
            let received = Arc::clone(&received);
            let outcome = Arc::clone(&outcome);
            field.map(move |chunk| {
                let chunk = chunk.map_err(|e| {
                    outcome.store(STREAM_READ_FAILED, Ordering::SeqCst);
                    io::Error::other(e)
                })?;
                let total = received.fetch_add(chunk.len() as u64, Ordering::SeqCst)
                    + chunk.len() as u64;
                if total > limit {
                    outcome.store(STREAM_TOO_LARGE, Ordering::SeqCst);
                    return Err(io::Error::other("file exceeds field size limit"));
                }
                Ok(chunk)
            })
        };
        let mut reader = StreamReader::new(Box::pin(stream));

        match self
            .storage
            .put_stream(&key, &content_type, &mut reader)
            .await
        {
            Ok(stored) => {
                let size = received.load(Ordering::SeqCst);
                info!(
                    "Stored upload: field={}, key={}, size={}",
                    rule.name, stored.key, size
                );
                Ok(UploadedFile {
                    field: rule.name,
                    original_name,
                    content_type,
                    size,
                    key: stored.key,
                    location: stored.location,
                })
            }
            Err(e) => {
                // A multipart upload may have been partially written
                remove_objects(self.storage.as_ref(), std::slice::from_ref(&key)).await;
                match outcome.load(Ordering::SeqCst) {
                    STREAM_TOO_LARGE => Err(AppError::BadRequest(format!(
                        "{} exceeds the maximum size of {} bytes",
                        capitalize(rule.name),
                        limit
                    ))),
                    STREAM_READ_FAILED => Err(AppError::BadRequest(format!(
                        "Failed to read file data for '{}'",
                        rule.name
                    ))),
                    _ => Err(e),
                }
            }
        }
    }
}

/// Lowercased media type without parameters, empty when absent
fn normalize_content_type(raw: Option<&str>) -> String {
    raw.unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// File extension for a stored object
fn extension_for(content_type: &str, original_name: Option<&str>) -> String {
    let known = match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/heif" => Some("heif"),
        "image/avif" => Some("avif"),
        "image/svg+xml" => Some("svg"),
        "video/mp4" => Some("mp4"),
        "video/quicktime" => Some("mov"),
        "video/webm" => Some("webm"),
        "video/x-msvideo" => Some("avi"),
        "video/x-matroska" => Some("mkv"),
        "video/3gpp" => Some("3gp"),
        _ => None,
    };
    if let Some(ext) = known {
        return ext.to_string();
    }

    original_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "bin".to_string())
}

/// Object key: `{prefix}/{field}/{YYYY-MM-DD}/{uuid-v7}.{ext}`
fn storage_key(
    prefix: &str,
    field: &str,
    content_type: &str,
    original_name: Option<&str>,
) -> String {
    format!(
        "{}/{}/{}/{}.{}",
        prefix,
        field,
        chrono::Utc::now().format("%Y-%m-%d"),
        Uuid::now_v7(),
        extension_for(content_type, original_name)
    )
}
