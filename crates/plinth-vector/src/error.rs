//! Error types for vector index operations.

use plinth_core::ErrorKind;

/// Result type alias for vector index operations.
pub type VectorResult<T> = std::result::Result<T, VectorError>;

/// Errors that can occur during vector index operations.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    /// Failed to connect to the backend.
    #[error("vector index connection error: {0}")]
    Connection(String),

    /// Backend operation failed.
    #[error("vector index backend error: {0}")]
    Backend(String),

    /// A vector's dimensionality does not match the configured dimension.
    ///
    /// This is always fatal: vectors are never truncated or zero-padded.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    Dimension {
        /// The platform-configured dimensionality.
        expected: usize,
        /// The dimensionality actually observed.
        actual: usize,
    },

    /// Invalid input to an index operation.
    #[error("invalid vector input: {0}")]
    Invalid(String),
}

impl VectorError {
    /// Creates a connection error.
    pub fn connection(message: impl std::fmt::Display) -> Self {
        Self::Connection(message.to_string())
    }

    /// Creates a backend error.
    pub fn backend(message: impl std::fmt::Display) -> Self {
        Self::Backend(message.to_string())
    }

    /// Creates an invalid-input error.
    pub fn invalid(message: impl std::fmt::Display) -> Self {
        Self::Invalid(message.to_string())
    }

    /// Maps this error onto the platform error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) | Self::Backend(_) => ErrorKind::DependencyTransient,
            Self::Dimension { .. } => ErrorKind::DependencyFatal,
            Self::Invalid(_) => ErrorKind::Invalid,
        }
    }
}
