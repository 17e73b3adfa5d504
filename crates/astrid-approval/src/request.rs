//! Approval request/decision types and permission scopes (§4.3).

use astrid_core::RiskLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Gating scope assigned to a tool, deciding whether a call needs a live
/// approval round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// Allowed without approval.
    Always,
    /// Approved once, then cached for the rest of the session (optional TTL).
    Session,
    /// Approval requested on every call.
    Once,
    /// Blocked unconditionally.
    Never,
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Always => "always",
            Self::Session => "session",
            Self::Once => "once",
            Self::Never => "never",
        };
        write!(f, "{s}")
    }
}

/// Unique identifier for an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Create a new random request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

/// A request for human approval of a tool call, carried to the registered
/// [`crate::manager::ApprovalCallback`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Unique request identifier.
    pub id: RequestId,
    /// Name of the tool awaiting approval.
    pub tool_name: String,
    /// Arguments the tool would be invoked with.
    pub arguments: serde_json::Value,
    /// Risk level assigned to the tool.
    pub risk_level: RiskLevel,
    /// Human-readable message shown alongside the request.
    pub message: String,
}

impl ApprovalRequest {
    /// Create a new approval request.
    #[must_use]
    pub fn new(
        tool_name: impl Into<String>,
        arguments: serde_json::Value,
        risk_level: RiskLevel,
    ) -> Self {
        let tool_name = tool_name.into();
        let message = format!("approval requested for tool '{tool_name}' (risk: {risk_level})");
        Self {
            id: RequestId::new(),
            tool_name,
            arguments,
            risk_level,
            message,
        }
    }

    /// Override the default message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl fmt::Display for ApprovalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.risk_level, self.message)
    }
}

/// The decision returned by an [`crate::manager::ApprovalCallback`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDecision {
    /// Whether the call was approved.
    pub approved: bool,
    /// Reason given by the approver, if any.
    pub reason: Option<String>,
    /// Scope to cache the approval under, if the approver granted one wider
    /// than a single call (only meaningful when `approved` is `true`).
    pub scope: Option<PermissionScope>,
    /// Identity of whoever (or whatever) approved the request.
    pub approved_by: Option<String>,
}

impl ApprovalDecision {
    /// A one-time approval with no cached scope.
    #[must_use]
    pub fn approve() -> Self {
        Self {
            approved: true,
            reason: None,
            scope: None,
            approved_by: None,
        }
    }

    /// An approval that should be cached at the given scope.
    #[must_use]
    pub fn approve_with_scope(scope: PermissionScope) -> Self {
        Self {
            approved: true,
            reason: None,
            scope: Some(scope),
            approved_by: None,
        }
    }

    /// A denial with a reason.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
            scope: None,
            approved_by: None,
        }
    }

    /// Record who granted or denied the decision.
    #[must_use]
    pub fn with_approved_by(mut self, approved_by: impl Into<String>) -> Self {
        self.approved_by = Some(approved_by.into());
        self
    }
}
