//! Platform-wide error taxonomy.
//!
//! Every crate in the workspace maps its own failures onto [`ErrorKind`] so
//! that propagation policy (degrade, surface, persist-and-surface) can be
//! decided by category rather than by string matching.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

/// Type alias for boxed errors that are Send + Sync.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for platform operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error kind enumeration for categorizing platform errors.
///
/// Separated from [`Error`] so callers can pattern-match on the category
/// without destructuring the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced entity (agent, prompt, version, source, chunk) is missing.
    NotFound,
    /// Malformed input: empty query, unknown model alias, unsupported MIME.
    Invalid,
    /// A capability the request needs is absent from the selected model.
    /// Handled by degradation (e.g. image placeholder), not a hard failure.
    CapabilityMismatch,
    /// Transient network or provider error; retryable.
    DependencyTransient,
    /// Non-retryable dependency failure, e.g. embedding dimension mismatch.
    DependencyFatal,
    /// Cooperative cancellation.
    Cancelled,
    /// Everything else.
    Internal,
}

impl ErrorKind {
    /// Returns the error kind as a string for metrics and run records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Invalid => "invalid",
            Self::CapabilityMismatch => "capability_mismatch",
            Self::DependencyTransient => "dependency_transient",
            Self::DependencyFatal => "dependency_fatal",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }

    /// Returns true if an operation failing with this kind may be retried.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::DependencyTransient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform error with structured information.
///
/// Carries a category, a human-readable message, and an optional source for
/// error chain tracking.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new [`Error`].
    #[inline]
    fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source error, enabling error chain tracking.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Creates a not-found error for a named entity.
    #[inline]
    pub fn not_found(
        entity: impl Into<Cow<'static, str>>,
        id: impl fmt::Display,
    ) -> Self {
        Self::new(
            ErrorKind::NotFound,
            format!("{} not found: {id}", entity.into()),
        )
    }

    /// Creates an invalid-input error.
    #[inline]
    pub fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Invalid, message)
    }

    /// Creates a capability-mismatch error.
    #[inline]
    pub fn capability(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::CapabilityMismatch, message)
    }

    /// Creates a transient dependency error.
    #[inline]
    pub fn transient(
        dependency: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let full = format!("{}: {}", dependency.into(), message.into());
        Self::new(ErrorKind::DependencyTransient, full)
    }

    /// Creates a fatal dependency error.
    #[inline]
    pub fn fatal(
        dependency: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let full = format!("{}: {}", dependency.into(), message.into());
        Self::new(ErrorKind::DependencyFatal, full)
    }

    /// Creates a cancellation error.
    #[inline]
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "operation cancelled")
    }

    /// Creates an internal error.
    #[inline]
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns true if this error may be retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_creation() {
        let error = Error::invalid("empty query");
        assert_eq!(error.kind(), ErrorKind::Invalid);
        assert_eq!(error.message(), "empty query");
    }

    #[test]
    fn error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing blob");
        let error = Error::transient("object-store", "read failed").with_source(source);

        assert!(StdError::source(&error).is_some());
        assert_eq!(error.kind(), ErrorKind::DependencyTransient);
        assert!(error.is_retryable());
    }

    #[test]
    fn not_found_message() {
        let id = uuid::Uuid::nil();
        let error = Error::not_found("agent", id);
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(error.message().contains("agent not found"));
    }

    #[test]
    fn kind_as_str() {
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
        assert_eq!(ErrorKind::CapabilityMismatch.as_str(), "capability_mismatch");
        assert_eq!(ErrorKind::DependencyFatal.as_str(), "dependency_fatal");
        assert!(!ErrorKind::DependencyFatal.is_retryable());
        assert!(ErrorKind::DependencyTransient.is_retryable());
    }
}
