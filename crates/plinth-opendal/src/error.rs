//! Storage error types.

use plinth_core::ErrorKind;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to initialize the storage backend.
    #[error("storage initialization failed: {0}")]
    Init(String),

    /// Blob not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid path or key component.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Presigning is unsupported by the configured backend.
    #[error("presigning unsupported: {0}")]
    PresignUnsupported(String),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(opendal::Error),
}

impl StorageError {
    /// Creates a new initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Creates a new not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Creates a new invalid path error.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Maps this error onto the platform error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidPath(_) => ErrorKind::Invalid,
            Self::Init(_) | Self::PresignUnsupported(_) => ErrorKind::DependencyFatal,
            Self::PermissionDenied(_) | Self::Backend(_) => ErrorKind::DependencyTransient,
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            ErrorKind::Unsupported => Self::PresignUnsupported(err.to_string()),
            _ => Self::Backend(err),
        }
    }
}
