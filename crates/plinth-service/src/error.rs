//! Error types for the service layer.

use plinth_core::ErrorKind;
use plinth_postgres::PgError;
use plinth_inference::LlmError;
use plinth_runtime::RuntimeError;

/// Result type alias for service layer operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by the chat orchestrator and platform entry points.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A referenced entity is missing.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Entity id or slug.
        id: String,
    },

    /// Malformed input: empty query, unknown model alias, inactive agent,
    /// missing template variables.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// Relational store error.
    #[error(transparent)]
    Database(#[from] PgError),

    /// Pipeline error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Model provider error.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Cooperative cancellation.
    #[error("operation cancelled")]
    Cancelled,
}

impl ServiceError {
    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates an invalid-request error.
    pub fn invalid(message: impl std::fmt::Display) -> Self {
        Self::Invalid(message.to_string())
    }

    /// Maps this error onto the platform error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Invalid(_) => ErrorKind::Invalid,
            Self::Database(e) => e.kind(),
            Self::Runtime(e) => e.kind(),
            Self::Llm(e) => e.kind(),
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}
