//! LLM-related error types.

use thiserror::Error;

/// Errors that can occur with LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// API key not configured.
    #[error("API key not configured for {provider}")]
    ApiKeyNotConfigured {
        /// Provider name.
        provider: String,
    },

    /// Request rejected for reasons unrelated to auth or rate limiting.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimitExceeded {
        /// Seconds to wait before retrying, if the provider reported one.
        retry_after_secs: Option<u64>,
    },

    /// Invalid response from the provider.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Model not supported.
    #[error("model not supported: {model}")]
    ModelNotSupported {
        /// Model name.
        model: String,
    },

    /// Context length exceeded.
    #[error("context length exceeded: {current} tokens, max is {max}")]
    ContextLengthExceeded {
        /// Current token count.
        current: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Streaming error.
    #[error("streaming error: {0}")]
    StreamingError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Transport-level failure (connection reset, DNS, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider reported an internal server error.
    #[error("server error: {0}")]
    Server(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Broad error category, per the provider port's error classification
/// contract: every implementation must be able to sort its failures into
/// one of these buckets so retry policy can key off them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or rejected credentials.
    Auth,
    /// Caller is being throttled.
    RateLimit,
    /// The conversation exceeds the model's context window.
    ContextLength,
    /// Network/connection-level failure, generally safe to retry.
    Transport,
    /// The request itself was malformed; retrying without changes will not
    /// help.
    InvalidRequest,
    /// The provider's own infrastructure failed.
    Server,
}

impl LlmError {
    /// Classify this error for retry-policy purposes.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ApiKeyNotConfigured { .. } => ErrorKind::Auth,
            Self::RateLimitExceeded { .. } => ErrorKind::RateLimit,
            Self::ContextLengthExceeded { .. } => ErrorKind::ContextLength,
            Self::Transport(_) | Self::StreamingError(_) => ErrorKind::Transport,
            Self::Server(_) => ErrorKind::Server,
            Self::InvalidRequest(_)
            | Self::InvalidResponse(_)
            | Self::ModelNotSupported { .. }
            | Self::SerializationError(_)
            | Self::ConfigError(_) => ErrorKind::InvalidRequest,
        }
    }

    /// Whether a caller should generally retry this error unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::RateLimit | ErrorKind::Transport | ErrorKind::Server)
    }
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_retryable() {
        assert!(LlmError::Transport("reset".into()).is_retryable());
    }

    #[test]
    fn invalid_request_is_not_retryable() {
        assert!(!LlmError::InvalidRequest("bad schema".into()).is_retryable());
    }

    #[test]
    fn rate_limit_classifies_as_rate_limit() {
        assert_eq!(
            LlmError::RateLimitExceeded { retry_after_secs: Some(5) }.kind(),
            ErrorKind::RateLimit
        );
    }
}
