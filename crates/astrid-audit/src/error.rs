//! Audit-related error types.

use thiserror::Error;

/// Errors that can occur with audit logging.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Entry could not be written to the file sink.
    #[error("audit sink io error: {0}")]
    Io(String),

    /// Entry could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Entry not found.
    #[error("audit entry not found: sequence {sequence}")]
    EntryNotFound {
        /// The sequence number that was not found.
        sequence: u64,
    },

    /// Session not found.
    #[error("session not found: {session_id}")]
    SessionNotFound {
        /// The session ID that was not found.
        session_id: String,
    },
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
