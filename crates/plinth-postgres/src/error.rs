//! Error types and utilities for database operations.

use std::borrow::Cow;

use deadpool::managed::TimeoutType;
use diesel::result::{ConnectionError, Error};
use diesel_async::pooled_connection::PoolError as DieselPoolError;
use diesel_async::pooled_connection::deadpool::PoolError as DeadpoolError;
use plinth_core::ErrorKind;

/// Type-erased error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for database operations.
pub type PgResult<T> = Result<T, PgError>;

/// Comprehensive error type for all PostgreSQL database operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled appropriately"]
pub enum PgError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database operation timed out.
    #[error("database operation timed out")]
    Timeout(TimeoutType),

    /// Failed to establish or maintain a database connection.
    #[error("database connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Database query execution failed.
    #[error("database query error: {0}")]
    Query(#[from] Error),

    /// Unexpected error occurred.
    #[error("unexpected error: {0}")]
    Unexpected(Cow<'static, str>),
}

impl PgError {
    /// Extracts the constraint name from a constraint violation error.
    pub fn constraint(&self) -> Option<&str> {
        let PgError::Query(err) = self else {
            return None;
        };

        let Error::DatabaseError(_, err) = err else {
            return None;
        };

        err.constraint_name()
    }

    /// Returns true if this error is the diesel not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PgError::Query(Error::NotFound))
    }

    /// Maps this error onto the platform error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Query(Error::NotFound) => ErrorKind::NotFound,
            Self::Config(_) => ErrorKind::DependencyFatal,
            Self::Timeout(_) | Self::Connection(_) => ErrorKind::DependencyTransient,
            Self::Query(_) | Self::Unexpected(_) => ErrorKind::Internal,
        }
    }
}

impl From<DeadpoolError> for PgError {
    fn from(err: DeadpoolError) -> Self {
        match err {
            DeadpoolError::Timeout(timeout) => PgError::Timeout(timeout),
            DeadpoolError::Backend(DieselPoolError::ConnectionError(e)) => PgError::Connection(e),
            DeadpoolError::Backend(DieselPoolError::QueryError(e)) => PgError::Query(e),
            other => PgError::Unexpected(other.to_string().into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_kind() {
        let err = PgError::Query(Error::NotFound);
        assert!(err.is_not_found());
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn config_is_fatal() {
        let err = PgError::Config("bad url".to_string());
        assert_eq!(err.kind(), ErrorKind::DependencyFatal);
    }
}
