//! Error types for the runtime pipelines.

use plinth_core::ErrorKind;
use plinth_opendal::StorageError;
use plinth_postgres::PgError;
use plinth_inference::LlmError;
use plinth_vector::VectorError;

/// Result type alias for runtime operations.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur in the ingestion and retrieval pipelines.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A referenced entity is missing.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Entity id.
        id: String,
    },

    /// Malformed input.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// No parser is registered for the source's MIME type.
    #[error("unsupported MIME type: {0}")]
    UnsupportedMime(String),

    /// Text extraction failed.
    #[error("parse failed: {0}")]
    Parse(String),

    /// Relational store error.
    #[error(transparent)]
    Database(#[from] PgError),

    /// Vector index error.
    #[error(transparent)]
    Vector(#[from] VectorError),

    /// Object storage error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Model provider error.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// An ingestion run is already in flight for the source.
    #[error("ingestion already in flight for source {0}")]
    IngestInFlight(uuid::Uuid),

    /// Cooperative cancellation.
    #[error("operation cancelled")]
    Cancelled,
}

impl RuntimeError {
    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates an invalid-input error.
    pub fn invalid(message: impl std::fmt::Display) -> Self {
        Self::Invalid(message.to_string())
    }

    /// Creates a parse error.
    pub fn parse(message: impl std::fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// Maps this error onto the platform error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Invalid(_) | Self::UnsupportedMime(_) | Self::Parse(_) => ErrorKind::Invalid,
            Self::Database(e) => e.kind(),
            Self::Vector(e) => e.kind(),
            Self::Storage(e) => e.kind(),
            Self::Llm(e) => e.kind(),
            Self::IngestInFlight(_) => ErrorKind::Invalid,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}
