//! Storage module for report media
//!
//! Provides the object storage abstraction used by the upload pipeline and an
//! S3-compatible implementation backed by rust-s3.

mod s3_client;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::core::error::Result;

pub use s3_client::S3Storage;

/// Object written to storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object key inside the bucket
    pub key: String,
    /// Publicly resolvable URL of the object
    pub location: String,
}

/// Streaming object storage used for uploaded media
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stream `reader` to `key` until EOF. An error from the reader aborts the write.
    async fn put_stream(
        &self,
        key: &str,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<StoredObject>;

    /// Remove an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}
