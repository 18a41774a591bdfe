//! Storage backend implementation.

use std::time::Duration;

use bytes::Bytes;
use opendal::{Operator, services};

use crate::TRACING_TARGET;
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};

/// Metadata for a stored blob.
#[derive(Debug, Clone)]
pub struct BlobMetadata {
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, if the backend reports one.
    pub last_modified: Option<jiff::Timestamp>,
    /// Content type, if the backend reports one.
    pub content_type: Option<String>,
}

/// A presigned URL with its HTTP method and expiry.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The URL to hand to the caller.
    pub url: String,
    /// HTTP method the URL is valid for (`GET` or `PUT`).
    pub method: String,
    /// Validity window.
    pub expires_in: Duration,
}

/// Unified storage backend that wraps OpenDAL operators.
#[derive(Clone)]
pub struct StorageBackend {
    operator: Operator,
    config: StorageConfig,
}

impl StorageBackend {
    /// Creates a new storage backend from configuration.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        let operator = Self::create_operator(&config)?;

        tracing::info!(
            target: TRACING_TARGET,
            backend = %config.backend_name(),
            "Storage backend initialized"
        );

        Ok(Self { operator, config })
    }

    /// Returns the backend name.
    pub fn backend_name(&self) -> &'static str {
        self.config.backend_name()
    }

    /// Reads a blob in full.
    pub async fn read(&self, path: &str) -> StorageResult<Bytes> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            "Reading blob"
        );

        let data = self.operator.read(path).await?;
        Ok(data.to_bytes())
    }

    /// Writes a blob in full, overwriting any existing content.
    pub async fn write(&self, path: &str, data: Bytes) -> StorageResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            size = data.len(),
            "Writing blob"
        );

        self.operator.write(path, data).await?;
        Ok(())
    }

    /// Gets metadata for a blob.
    pub async fn stat(&self, path: &str) -> StorageResult<BlobMetadata> {
        let meta = self.operator.stat(path).await?;

        let last_modified = meta
            .last_modified()
            .and_then(|dt| jiff::Timestamp::from_second(dt.timestamp()).ok());

        Ok(BlobMetadata {
            size: meta.content_length(),
            last_modified,
            content_type: meta.content_type().map(|s| s.to_string()),
        })
    }

    /// Deletes a blob. Deleting a missing blob is not an error.
    pub async fn delete(&self, path: &str) -> StorageResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            "Deleting blob"
        );

        self.operator.delete(path).await?;
        Ok(())
    }

    /// Deletes every blob under a prefix.
    pub async fn delete_prefix(&self, prefix: &str) -> StorageResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            prefix = %prefix,
            "Deleting blobs under prefix"
        );

        self.operator.remove_all(prefix).await?;
        Ok(())
    }

    /// Mints a presigned download URL.
    pub async fn presign_download(
        &self,
        path: &str,
        expires_in: Duration,
    ) -> StorageResult<PresignedUrl> {
        let req = self.operator.presign_read(path, expires_in).await?;

        Ok(PresignedUrl {
            url: req.uri().to_string(),
            method: "GET".to_string(),
            expires_in,
        })
    }

    /// Mints a presigned upload URL.
    pub async fn presign_upload(
        &self,
        path: &str,
        expires_in: Duration,
    ) -> StorageResult<PresignedUrl> {
        let req = self.operator.presign_write(path, expires_in).await?;

        Ok(PresignedUrl {
            url: req.uri().to_string(),
            method: "PUT".to_string(),
            expires_in,
        })
    }

    /// Creates an OpenDAL operator based on configuration.
    fn create_operator(config: &StorageConfig) -> StorageResult<Operator> {
        match config {
            #[cfg(feature = "s3")]
            StorageConfig::S3(cfg) => {
                let mut builder = services::S3::default()
                    .bucket(&cfg.bucket)
                    .region(&cfg.region);

                if let Some(ref endpoint) = cfg.endpoint {
                    builder = builder.endpoint(endpoint);
                }
                if let Some(ref access_key_id) = cfg.access_key_id {
                    builder = builder.access_key_id(access_key_id);
                }
                if let Some(ref secret_access_key) = cfg.secret_access_key {
                    builder = builder.secret_access_key(secret_access_key);
                }
                if let Some(ref prefix) = cfg.prefix {
                    builder = builder.root(prefix);
                }

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }
            #[cfg(feature = "gcs")]
            StorageConfig::Gcs(cfg) => {
                let mut builder = services::Gcs::default().bucket(&cfg.bucket);

                if let Some(ref credentials) = cfg.credentials {
                    builder = builder.credential(credentials);
                }
                if let Some(ref prefix) = cfg.prefix {
                    builder = builder.root(prefix);
                }

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }
            #[cfg(feature = "azblob")]
            StorageConfig::AzureBlob(cfg) => {
                let mut builder = services::Azblob::default()
                    .container(&cfg.container)
                    .account_name(&cfg.account_name);

                if let Some(ref account_key) = cfg.account_key {
                    builder = builder.account_key(account_key);
                }
                if let Some(ref prefix) = cfg.prefix {
                    builder = builder.root(prefix);
                }

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackend")
            .field("backend", &self.config.backend_name())
            .finish()
    }
}
