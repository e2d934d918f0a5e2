//! S3-compatible storage client
//!
//! Streams report media to AWS S3 or any S3-compatible service (MinIO,
//! LocalStack) and derives the public location of stored objects.
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::modules::storage::{ObjectStorage, StoredObject};

/// S3-compatible storage client
pub struct S3Storage {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    /// Base URL that object keys are appended to for public locations
    public_base_url: String,
    custom_endpoint: bool,
}

impl S3Storage {
    /// Create a new storage client from configuration
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create S3 credentials: {}", e)))?;

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse::<Region>()
                .map_err(|e| AppError::Internal(format!("Invalid AWS_REGION: {}", e)))?,
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create S3 bucket handle: {}", e)))?;

        // Custom endpoints are addressed path-style (http://endpoint/bucket/key)
        if config.endpoint.is_some() {
            bucket.set_path_style();
        }

        let client = Self {
            bucket,
            region,
            credentials,
            public_base_url: public_base_url(config),
            custom_endpoint: config.endpoint.is_some(),
        };

        info!(
            "S3 storage initialized for bucket: {}, public base: {}",
            client.bucket.name(),
            client.public_base_url
        );

        Ok(client)
    }

    /// Create the bucket on self-hosted endpoints when it is missing.
    ///
    /// AWS buckets are provisioned out of band, so this is a no-op there.
    pub async fn ensure_bucket_exists(&self) -> Result<()> {
        if !self.custom_endpoint {
            return Ok(());
        }

        match Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
                Ok(())
            }
        }
    }

    /// Get the bucket name
    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    /// Public URL of an object key
    pub fn location_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, encode_key(key))
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put_stream(
        &self,
        key: &str,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<StoredObject> {
        let mut reader = reader;
        self.bucket
            .put_object_stream_with_content_type(&mut reader, key, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload '{}': {}", key, e)))?;

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket.name());

        Ok(StoredObject {
            key: key.to_string(),
            location: self.location_for(key),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete '{}': {}", key, e)))?;

        debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }
}

/// Base URL for public object locations
///
/// Precedence: explicit public URL, custom endpoint (path-style), AWS
/// virtual-hosted style.
fn public_base_url(config: &StorageConfig) -> String {
    if let Some(public_url) = &config.public_url {
        return public_url.clone();
    }
    match &config.endpoint {
        Some(endpoint) => format!("{}/{}", endpoint, config.bucket),
        None => format!(
            "https://{}.s3.{}.amazonaws.com",
            config.bucket, config.region
        ),
    }
}

/// Percent-encode each path segment of a key
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
