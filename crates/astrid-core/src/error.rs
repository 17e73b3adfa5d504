//! Shared error types for Astrid core data model operations.

use thiserror::Error;

/// Errors that can occur while validating or manipulating core conversation
/// and tool-descriptor types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A tool name did not match the required `[A-Za-z0-9_-]+` pattern after
    /// sanitation.
    #[error("invalid tool name: {0}")]
    InvalidToolName(String),

    /// A `ToolUse`/`ToolResult` pair invariant was violated (e.g. a result
    /// with no matching use, or an attempt to remove one half of a pair).
    #[error("tool-use/tool-result pairing violated: {0}")]
    PairingViolation(String),

    /// A memory entry key did not match the required dotted, case-sensitive
    /// pattern, or used a reserved tier prefix incorrectly.
    #[error("invalid memory key: {0}")]
    InvalidMemoryKey(String),

    /// Generic serialization failure when round-tripping core types.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        let err = CoreError::InvalidToolName("my tool".to_string());
        assert_eq!(err.to_string(), "invalid tool name: my tool");
    }
}
