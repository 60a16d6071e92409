use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;

/// Presigned download links stay valid for one hour.
const PRESIGN_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Blob storage for uploaded documents.
#[async_trait]
pub trait ObjectStorage: Send + Sync + 'static {
    /// Writes the blob at `key`, replacing any previous content.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Returns `None` when no blob exists at `key`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError>;

    /// A URL the client can download the blob from.
    async fn url_for(&self, key: &str) -> Result<String, StorageError>;
}

/// S3-compatible storage (AWS in production, MinIO locally).
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("put {key}: {e}")))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false)
                {
                    return Ok(None);
                }
                return Err(StorageError::Backend(format!("get {key}: {err}")));
            }
        };

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("read {key}: {e}")))?;

        Ok(Some(data.into_bytes()))
    }

    async fn url_for(&self, key: &str) -> Result<String, StorageError> {
        let config = PresigningConfig::expires_in(PRESIGN_TTL)
            .map_err(|e| StorageError::Backend(format!("presign config: {e}")))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| StorageError::Backend(format!("presign {key}: {e}")))?;

        Ok(presigned.uri().to_string())
    }
}
