//! Error types for the model layer.

use plinth_core::ErrorKind;

/// Result type alias for model layer operations.
pub type LlmResult<T> = std::result::Result<T, LlmError>;

/// Errors that can occur during model layer operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Provider returned a non-success status.
    #[error("provider error: {provider}: status {status}: {message}")]
    Api {
        /// Provider name.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Response body or message.
        message: String,
    },

    /// Network-level failure reaching the provider.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider's response could not be parsed.
    #[error("response parse error: {0}")]
    Parse(String),

    /// An embedding's dimensionality did not match the requested dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    Dimension {
        /// Requested dimensionality.
        expected: usize,
        /// Observed dimensionality.
        actual: usize,
    },

    /// The streaming body ended without a terminal event.
    #[error("stream error: {0}")]
    Stream(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The call was cancelled cooperatively.
    #[error("operation cancelled")]
    Cancelled,

    /// The call exceeded its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl LlmError {
    /// Creates an API error.
    pub fn api(
        provider: impl std::fmt::Display,
        status: u16,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Api {
            provider: provider.to_string(),
            status,
            message: message.to_string(),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl std::fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// Creates a stream error.
    pub fn stream(message: impl std::fmt::Display) -> Self {
        Self::Stream(message.to_string())
    }

    /// Creates a configuration error.
    pub fn config(message: impl std::fmt::Display) -> Self {
        Self::Config(message.to_string())
    }

    /// Maps this error onto the platform error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api { status, .. } if *status == 429 || *status >= 500 => {
                ErrorKind::DependencyTransient
            }
            Self::Api { .. } => ErrorKind::DependencyFatal,
            Self::Transport(_) | Self::Timeout(_) | Self::Stream(_) => {
                ErrorKind::DependencyTransient
            }
            Self::Parse(_) => ErrorKind::DependencyFatal,
            Self::Dimension { .. } => ErrorKind::DependencyFatal,
            Self::Config(_) => ErrorKind::Invalid,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns true if the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_are_transient() {
        let err = LlmError::api("openai", 429, "slow down");
        assert_eq!(err.kind(), ErrorKind::DependencyTransient);
        assert!(err.is_retryable());
    }

    #[test]
    fn dimension_mismatch_is_fatal() {
        let err = LlmError::Dimension {
            expected: 1536,
            actual: 1535,
        };
        assert_eq!(err.kind(), ErrorKind::DependencyFatal);
        assert!(!err.is_retryable());
    }

    #[test]
    fn client_errors_are_fatal() {
        let err = LlmError::api("openrouter", 400, "bad request");
        assert_eq!(err.kind(), ErrorKind::DependencyFatal);
    }
}
