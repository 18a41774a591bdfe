#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod backend;
mod config;
mod error;
mod key;

pub use backend::{BlobMetadata, PresignedUrl, StorageBackend};
pub use config::StorageConfig;
#[cfg(feature = "azblob")]
pub use config::AzureBlobConfig;
#[cfg(feature = "gcs")]
pub use config::GcsConfig;
#[cfg(feature = "s3")]
pub use config::S3Config;
pub use error::{StorageError, StorageResult};
pub use key::{ChatImageKey, SourceKey, StorageKey};

/// Tracing target for storage operations.
pub const TRACING_TARGET: &str = "plinth_opendal";
