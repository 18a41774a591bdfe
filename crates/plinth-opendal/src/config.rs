//! Storage configuration types.

use serde::{Deserialize, Serialize};

/// Amazon S3 (or S3-compatible) configuration.
#[cfg(feature = "s3")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket name.
    pub bucket: String,
    /// AWS region.
    pub region: String,
    /// Custom endpoint URL (for S3-compatible storage like MinIO, R2).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Access key ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    /// Secret access key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    /// Path prefix within the bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

#[cfg(feature = "s3")]
impl S3Config {
    /// Creates a new S3 configuration.
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            prefix: None,
        }
    }

    /// Sets the custom endpoint (for S3-compatible storage).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the access credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Sets the path prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Google Cloud Storage configuration.
#[cfg(feature = "gcs")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcsConfig {
    /// Bucket name.
    pub bucket: String,
    /// Service account credentials (JSON).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
    /// Path prefix within the bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// Azure Blob Storage configuration.
#[cfg(feature = "azblob")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureBlobConfig {
    /// Container name.
    pub container: String,
    /// Storage account name.
    pub account_name: String,
    /// Storage account key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_key: Option<String>,
    /// Path prefix within the container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum StorageConfig {
    /// Amazon S3 compatible storage.
    #[cfg(feature = "s3")]
    S3(S3Config),
    /// Google Cloud Storage.
    #[cfg(feature = "gcs")]
    Gcs(GcsConfig),
    /// Azure Blob Storage.
    #[cfg(feature = "azblob")]
    AzureBlob(AzureBlobConfig),
}

impl StorageConfig {
    /// Returns the backend name as a static string.
    pub fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "s3")]
            Self::S3(_) => "s3",
            #[cfg(feature = "gcs")]
            Self::Gcs(_) => "gcs",
            #[cfg(feature = "azblob")]
            Self::AzureBlob(_) => "azblob",
        }
    }
}
