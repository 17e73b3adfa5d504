//! Runtime error types.

use thiserror::Error;

/// Errors that can occur in the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Session not found.
    #[error("session not found: {session_id}")]
    SessionNotFound {
        /// The session ID.
        session_id: String,
    },

    /// Session already exists.
    #[error("session already exists: {session_id}")]
    SessionExists {
        /// The session ID.
        session_id: String,
    },

    /// LLM error.
    #[error("LLM error: {0}")]
    LlmError(#[from] astrid_llm::LlmError),

    /// Tool execution error outside the tool manager's own per-call
    /// handling (e.g. a missing registry entry at construction time).
    #[error("tool error: {0}")]
    ToolError(#[from] astrid_tools::ToolError),

    /// The permission/approval subsystem rejected or failed to resolve a
    /// call.
    #[error("approval error: {0}")]
    ApprovalErr(#[from] astrid_approval::ApprovalError),

    /// Audit error.
    #[error("audit error: {0}")]
    AuditError(#[from] astrid_audit::AuditError),

    /// Storage error.
    #[error("storage error: {0}")]
    StorageError(#[from] astrid_storage::StorageError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(#[from] astrid_config::ConfigError),

    /// Context overflow: no compaction strategy could bring the
    /// conversation back under the configured token budget.
    #[error("context overflow: {current} tokens exceeds limit of {max}")]
    ContextOverflow {
        /// Current token count.
        current: u64,
        /// Maximum allowed.
        max: u64,
    },

    /// Approval required.
    #[error("approval required for: {action}")]
    ApprovalRequired {
        /// The action requiring approval.
        action: String,
    },

    /// Approval denied.
    #[error("approval denied: {reason}")]
    ApprovalDenied {
        /// Reason for denial.
        reason: String,
    },

    /// The loop exceeded `run.max_iterations`.
    #[error("iteration limit exceeded: {max}")]
    IterationLimitExceeded {
        /// The configured limit.
        max: u32,
    },

    /// The loop exceeded `run.max_execution_ms`.
    #[error("execution time limit exceeded: {max_ms}ms")]
    ExecutionTimeExceeded {
        /// The configured limit, in milliseconds.
        max_ms: u64,
    },

    /// The loop exceeded `run.max_tool_calls`.
    #[error("tool call limit exceeded: {max}")]
    ToolCallLimitExceeded {
        /// The configured limit.
        max: u32,
    },

    /// A hook configured with a failing failure mode blocked the run.
    #[error("hook blocked the run: {reason}")]
    HookBlocked {
        /// The reason the hook gave for blocking.
        reason: String,
    },

    /// `run.error_handling.max_consecutive_errors` was reached for a
    /// single tool.
    #[error("too many consecutive errors for tool '{tool_name}': {count}")]
    TooManyConsecutiveErrors {
        /// The tool that kept failing.
        tool_name: String,
        /// How many consecutive failures were observed.
        count: u32,
    },

    /// A tool call failed under `tool-failure-mode: fail`.
    #[error("tool '{tool_name}' failed: {reason}")]
    ToolFailed {
        /// The tool that failed.
        tool_name: String,
        /// The error the tool returned.
        reason: String,
    },

    /// Sub-agent error.
    #[error("sub-agent error: {0}")]
    SubAgentError(String),

    /// The run was cancelled by the caller.
    #[error("run cancelled")]
    Cancelled,

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
