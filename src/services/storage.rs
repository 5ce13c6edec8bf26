// src/services/storage.rs
//! Blob storage behind the `BlobStore` capability trait
//!
//! The rest of the service only sees `put` / `list` / `remove_many` /
//! `public_url`; the S3 implementation (AWS or any S3-compatible host)
//! is swappable without touching callers. Listing names are relative to
//! the queried prefix, mirroring how callers build full paths back as
//! `{prefix}/{name}`.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("List failed: {0}")]
    List(String),

    #[error("Bulk remove failed: {0}")]
    Remove(String),
}

/// One stored object, named relative to the listing prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    pub name: String,
    pub size: i64,
}

/// Object-store capabilities the service relies on.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` at `path` and returns the object's public URL.
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Lists every object under `{prefix}/`, names relative to it.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>, StorageError>;

    /// Removes all given paths in one bulk call.
    async fn remove_many(&self, paths: &[String]) -> Result<(), StorageError>;

    /// Public URL for a stored path.
    fn public_url(&self, path: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// S3-compatible endpoint override (hosted storage, minio); plain
    /// AWS when absent.
    pub endpoint: Option<String>,
    /// CDN domain serving the bucket, used for public URLs when set.
    pub cdn_domain: Option<String>,
}

/// S3-backed implementation of `BlobStore`.
#[derive(Debug)]
pub struct S3Storage {
    client: S3Client,
    config: StorageConfig,
}

impl S3Storage {
    /// Builds the client once; credentials come from the ambient AWS
    /// environment (env vars / profile).
    pub async fn new(config: StorageConfig) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let client = match &config.endpoint {
            Some(endpoint) => {
                // S3-compatible hosts expect path-style addressing.
                let s3_config = aws_sdk_s3::config::Builder::from(&shared)
                    .endpoint_url(endpoint)
                    .force_path_style(true)
                    .build();
                S3Client::from_conf(s3_config)
            }
            None => S3Client::new(&shared),
        };

        Self { client, config }
    }
}

#[async_trait]
impl BlobStore for S3Storage {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(path)
            .body(ByteStream::from(Bytes::from(bytes)))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, key = %path, "Failed to upload object");
                StorageError::Upload(e.to_string())
            })?;

        info!(key = %path, bucket = %self.config.bucket, "Object uploaded");
        Ok(self.public_url(path))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>, StorageError> {
        // Trailing slash keeps sibling prefixes apart ("demo" must not
        // match "demo-2/...").
        let full_prefix = format!("{}/", prefix.trim_end_matches('/'));

        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .prefix(&full_prefix);

            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|e| {
                error!(
                    error = %e,
                    bucket = %self.config.bucket,
                    prefix = %full_prefix,
                    "Failed to list objects"
                );
                StorageError::List(e.to_string())
            })?;

            for obj in response.contents() {
                let Some(key) = obj.key() else { continue };
                let Some(name) = key.strip_prefix(&full_prefix) else {
                    continue;
                };
                if name.is_empty() {
                    continue;
                }
                objects.push(BlobObject {
                    name: name.to_string(),
                    size: obj.size().unwrap_or(0),
                });
            }

            match response.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        debug!(count = objects.len(), prefix = %full_prefix, "Listed objects");
        Ok(objects)
    }

    async fn remove_many(&self, paths: &[String]) -> Result<(), StorageError> {
        let identifiers: Vec<ObjectIdentifier> = paths
            .iter()
            .map(|path| {
                ObjectIdentifier::builder()
                    .key(path)
                    .build()
                    .map_err(|e| StorageError::Remove(e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(|e| StorageError::Remove(e.to_string()))?;

        self.client
            .delete_objects()
            .bucket(&self.config.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    bucket = %self.config.bucket,
                    count = paths.len(),
                    "Bulk object removal failed"
                );
                StorageError::Remove(e.to_string())
            })?;

        info!(count = paths.len(), bucket = %self.config.bucket, "Objects removed");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        if let Some(cdn) = &self.config.cdn_domain {
            return format!("https://{}/{}", cdn, path);
        }
        match &self.config.endpoint {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.config.bucket,
                path
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.config.bucket, self.config.region, path
            ),
        }
    }
}
