//! Audit entry types and actions.
//!
//! Every security-relevant operation in the agentic loop is recorded as a
//! plain structured entry: a sequence number, a timestamp, the action that
//! was taken, and its outcome. Entries are append-only within a session.

use astrid_core::{RiskLevel, SessionId, Timestamp};
use serde::{Deserialize, Serialize};

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonically increasing sequence number, scoped to `session_id`.
    pub sequence: u64,
    /// When this entry was recorded.
    pub timestamp: Timestamp,
    /// Session this entry belongs to.
    pub session_id: SessionId,
    /// The action being audited.
    pub action: AuditAction,
    /// Outcome of the action.
    pub outcome: AuditOutcome,
}

impl AuditEntry {
    /// Construct a new entry, stamped with the current time.
    #[must_use]
    pub fn new(session_id: SessionId, sequence: u64, action: AuditAction, outcome: AuditOutcome) -> Self {
        Self {
            sequence,
            timestamp: chrono::Utc::now(),
            session_id,
            action,
            outcome,
        }
    }
}

/// Actions that can be audited.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditAction {
    /// A tool call was executed.
    ToolCall {
        /// Tool name.
        tool: String,
        /// Tool call identifier.
        call_id: String,
    },

    /// A permission check was performed for a tool call.
    PermissionChecked {
        /// Tool name.
        tool: String,
        /// Risk level of the call.
        risk_level: RiskLevel,
    },

    /// Approval was requested from the user.
    ApprovalRequested {
        /// Tool name.
        tool: String,
        /// Risk level of the call.
        risk_level: RiskLevel,
    },

    /// User (or configured default) granted approval.
    ApprovalGranted {
        /// Tool name.
        tool: String,
        /// Scope the approval was granted under.
        scope: String,
    },

    /// User denied approval.
    ApprovalDenied {
        /// Tool name.
        tool: String,
        /// Reason given, if any.
        reason: Option<String>,
    },

    /// A hook fired for an event.
    HookFired {
        /// The hook event name.
        event: String,
        /// Number of hooks that ran.
        hook_count: usize,
    },

    /// The provider was called for a completion.
    ProviderRequest {
        /// Model identifier.
        model: String,
    },

    /// Context was compacted (messages evicted or summarized).
    ContextCompacted {
        /// Number of messages evicted.
        evicted_count: usize,
        /// Approximate tokens freed.
        tokens_freed: usize,
    },

    /// Session started.
    SessionStarted {
        /// Originating frontend (cli, api, etc).
        frontend: String,
    },

    /// Session ended.
    SessionEnded {
        /// Reason for ending.
        reason: String,
        /// Duration in seconds.
        duration_secs: u64,
    },

    /// A sub-agent was spawned.
    SubAgentSpawned {
        /// Parent session ID.
        parent_session_id: String,
        /// Child session ID.
        child_session_id: String,
        /// Task description.
        description: String,
    },

    /// Configuration was reloaded.
    ConfigReloaded,
}

impl AuditAction {
    /// A human-readable description of the action.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::ToolCall { tool, .. } => format!("Called tool {tool}"),
            Self::PermissionChecked { tool, .. } => format!("Checked permission for {tool}"),
            Self::ApprovalRequested { tool, .. } => format!("Approval requested for {tool}"),
            Self::ApprovalGranted { tool, scope } => format!("Approved {tool} ({scope})"),
            Self::ApprovalDenied { tool, .. } => format!("Denied {tool}"),
            Self::HookFired { event, hook_count } => format!("Fired {hook_count} hook(s) for {event}"),
            Self::ProviderRequest { model } => format!("Provider request to {model}"),
            Self::ContextCompacted { evicted_count, .. } => format!("Compacted {evicted_count} messages"),
            Self::SessionStarted { frontend } => format!("Session started via {frontend}"),
            Self::SessionEnded { reason, .. } => format!("Session ended: {reason}"),
            Self::SubAgentSpawned { description, .. } => format!("Spawned sub-agent: {description}"),
            Self::ConfigReloaded => "Configuration reloaded".to_string(),
        }
    }
}

/// Outcome of an audited action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Action succeeded.
    Success {
        /// Optional details.
        details: Option<String>,
    },
    /// Action failed.
    Failure {
        /// Error message.
        error: String,
    },
}

impl AuditOutcome {
    /// A success outcome with no details.
    #[must_use]
    pub fn success() -> Self {
        Self::Success { details: None }
    }

    /// A success outcome with details.
    #[must_use]
    pub fn success_with(details: impl Into<String>) -> Self {
        Self::Success {
            details: Some(details.into()),
        }
    }

    /// A failure outcome.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Whether this outcome represents success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
