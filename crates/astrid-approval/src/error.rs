//! Errors for the permission/approval system.

/// Errors that can occur while gating a tool call.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// Approval was denied by the callback or by policy.
    #[error("approval denied: {reason}")]
    Denied {
        /// The reason the action was denied.
        reason: String,
    },

    /// The approval request timed out waiting for a callback response.
    #[error("approval timeout after {timeout_ms}ms")]
    Timeout {
        /// Time awaited before timeout, in milliseconds.
        timeout_ms: u64,
    },

    /// The tool is blocked by the blocklist.
    #[error("blocked by policy: {tool_name} - {reason}")]
    PolicyBlocked {
        /// The tool being blocked.
        tool_name: String,
        /// The reason for blocking.
        reason: String,
    },

    /// Internal permission-manager error.
    #[error("internal approval error: {0}")]
    Internal(String),
}

/// Result type for approval/permission operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
