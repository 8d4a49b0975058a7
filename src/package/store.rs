//! Object store for code bundles.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PackagingError, Result};

/// Destination for uploaded bundles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads a local file under `bucket/key` with the given canned ACL.
    async fn upload(&self, file: &Path, bucket: &str, key: &str, acl: &str) -> Result<()>;
}

/// S3-backed object store.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    /// S3 client.
    client: Client,
}

impl S3ObjectStore {
    /// Creates a store from a loaded AWS configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, file: &Path, bucket: &str, key: &str, acl: &str) -> Result<()> {
        debug!("Uploading {} to s3://{bucket}/{key}", file.display());

        let upload_failed = |message: String| PackagingError::UploadFailed {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        };

        let body = ByteStream::from_path(file)
            .await
            .map_err(|e| upload_failed(format!("Failed to read bundle: {e}")))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .acl(ObjectCannedAcl::from(acl))
            .content_type("application/zip")
            .send()
            .await
            .map_err(|e| upload_failed(DisplayErrorContext(&e).to_string()))?;

        info!("Uploaded {} to s3://{bucket}/{key}", file.display());
        Ok(())
    }
}
