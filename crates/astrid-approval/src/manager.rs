//! `PermissionManager` — tool-call gating (§4.3).
//!
//! Check order: blocklist -> `Blocked`; allowlist -> `Allowed`; otherwise the
//! tool's effective [`PermissionScope`] decides. A `NeedsApproval` result is
//! resolved by the registered [`ApprovalCallback`]; if none is registered the
//! manager defaults to approving (overridable via
//! [`PermissionManager::with_default_approve_on_missing_callback`]) and logs
//! the fact.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use astrid_core::{RiskLevel, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{ApprovalError, ApprovalResult};
use crate::request::{ApprovalDecision, ApprovalRequest, PermissionScope};

/// Callback consulted when a tool call needs live approval.
///
/// Different embedders (CLI prompt, web UI, test harness) implement this to
/// provide their own approval UX.
#[async_trait]
pub trait ApprovalCallback: Send + Sync {
    /// Present a request to the approver and return their decision.
    async fn approve(&self, request: &ApprovalRequest) -> ApprovalDecision;
}

/// Outcome of a permission check, before any approval round-trip.
#[derive(Debug, Clone)]
pub enum PermissionResult {
    /// The call is allowed outright.
    Allowed,
    /// The call is blocked unconditionally.
    Blocked {
        /// Reason for the block.
        reason: String,
    },
    /// The call needs a live approval decision.
    NeedsApproval(ApprovalRequest),
}

impl PermissionResult {
    /// Whether this result allows the call without further action.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// A cached session-scoped approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionApproval {
    /// When the approval was granted.
    pub approved_at: Timestamp,
    /// Optional time-to-live, in seconds.
    pub ttl_secs: Option<u64>,
    /// Who granted the approval, if known.
    pub approved_by: Option<String>,
}

impl SessionApproval {
    fn is_expired(&self) -> bool {
        let Some(ttl) = self.ttl_secs else {
            return false;
        };
        let elapsed = (chrono::Utc::now() - self.approved_at).num_seconds().max(0);
        #[allow(clippy::cast_sign_loss)]
        {
            elapsed as u64 > ttl
        }
    }
}

/// The serializable approval state, part of the session payload (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalState {
    /// Schema version, for forward compatibility.
    pub version: u32,
    /// Cached session approvals, keyed by tool name.
    pub approvals: HashMap<String, SessionApproval>,
    /// Tools always allowed regardless of configured scope.
    pub allowlist: Vec<String>,
    /// Tools always blocked regardless of configured scope.
    pub blocklist: Vec<String>,
}

const APPROVAL_STATE_VERSION: u32 = 1;

impl Default for ApprovalState {
    fn default() -> Self {
        Self {
            version: APPROVAL_STATE_VERSION,
            approvals: HashMap::new(),
            allowlist: Vec::new(),
            blocklist: Vec::new(),
        }
    }
}

/// Gates tool calls behind allow/block lists, per-tool scopes, and a
/// session-scoped approval cache.
pub struct PermissionManager {
    allowlist: RwLock<HashSet<String>>,
    blocklist: RwLock<HashSet<String>>,
    tool_scopes: RwLock<HashMap<String, PermissionScope>>,
    default_scope: PermissionScope,
    approvals: RwLock<HashMap<String, SessionApproval>>,
    callback: RwLock<Option<Arc<dyn ApprovalCallback>>>,
    approve_on_missing_callback: bool,
}

impl PermissionManager {
    /// Create a manager with the given default scope for tools that have no
    /// explicit per-tool scope configured.
    #[must_use]
    pub fn new(default_scope: PermissionScope) -> Self {
        Self {
            allowlist: RwLock::new(HashSet::new()),
            blocklist: RwLock::new(HashSet::new()),
            tool_scopes: RwLock::new(HashMap::new()),
            default_scope,
            approvals: RwLock::new(HashMap::new()),
            callback: RwLock::new(None),
            approve_on_missing_callback: true,
        }
    }

    /// Change whether a missing approval callback defaults to approve
    /// (`true`, the spec default) or deny (`false`).
    #[must_use]
    pub fn with_default_approve_on_missing_callback(mut self, approve: bool) -> Self {
        self.approve_on_missing_callback = approve;
        self
    }

    /// Register the approval callback.
    pub async fn register_callback(&self, callback: Arc<dyn ApprovalCallback>) {
        *self.callback.write().await = Some(callback);
    }

    /// Set the effective scope for a specific tool.
    pub async fn set_tool_scope(&self, tool_name: impl Into<String>, scope: PermissionScope) {
        self.tool_scopes.write().await.insert(tool_name.into(), scope);
    }

    /// Add a tool to the allowlist.
    pub async fn allow(&self, tool_name: impl Into<String>) {
        self.allowlist.write().await.insert(tool_name.into());
    }

    /// Add a tool to the blocklist.
    pub async fn block(&self, tool_name: impl Into<String>) {
        self.blocklist.write().await.insert(tool_name.into());
    }

    /// Check whether a tool call is allowed, blocked, or needs approval.
    /// Does not consult the approval callback.
    pub async fn check_permission(
        &self,
        tool_name: &str,
        arguments: &serde_json::Value,
        risk_level: RiskLevel,
    ) -> PermissionResult {
        if self.blocklist.read().await.contains(tool_name) {
            return PermissionResult::Blocked {
                reason: format!("tool '{tool_name}' is on the blocklist"),
            };
        }

        if self.allowlist.read().await.contains(tool_name) {
            return PermissionResult::Allowed;
        }

        let scope = self
            .tool_scopes
            .read()
            .await
            .get(tool_name)
            .copied()
            .unwrap_or(self.default_scope);

        match scope {
            PermissionScope::Always => PermissionResult::Allowed,
            PermissionScope::Never => PermissionResult::Blocked {
                reason: format!("tool '{tool_name}' scope is 'never'"),
            },
            PermissionScope::Session => {
                let cached = self.approvals.read().await.get(tool_name).cloned();
                match cached {
                    Some(approval) if !approval.is_expired() => PermissionResult::Allowed,
                    _ => PermissionResult::NeedsApproval(ApprovalRequest::new(
                        tool_name,
                        arguments.clone(),
                        risk_level,
                    )),
                }
            },
            PermissionScope::Once => PermissionResult::NeedsApproval(ApprovalRequest::new(
                tool_name,
                arguments.clone(),
                risk_level,
            )),
        }
    }

    /// Run the full gate: check permission, and resolve a `NeedsApproval`
    /// result through the registered callback (or the configured default).
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::PolicyBlocked`] if blocked, or
    /// [`ApprovalError::Denied`] if the approval callback denies the call.
    pub async fn gate(
        &self,
        tool_name: &str,
        arguments: &serde_json::Value,
        risk_level: RiskLevel,
    ) -> ApprovalResult<()> {
        match self
            .check_permission(tool_name, arguments, risk_level)
            .await
        {
            PermissionResult::Allowed => Ok(()),
            PermissionResult::Blocked { reason } => Err(ApprovalError::PolicyBlocked {
                tool_name: tool_name.to_string(),
                reason,
            }),
            PermissionResult::NeedsApproval(request) => {
                let decision = self.request_approval(&request).await;
                if !decision.approved {
                    return Err(ApprovalError::Denied {
                        reason: decision
                            .reason
                            .unwrap_or_else(|| "denied by approval callback".to_string()),
                    });
                }

                if let Some(scope) = decision.scope
                    && scope == PermissionScope::Session
                {
                    self.approvals.write().await.insert(
                        tool_name.to_string(),
                        SessionApproval {
                            approved_at: chrono::Utc::now(),
                            ttl_secs: None,
                            approved_by: decision.approved_by,
                        },
                    );
                }

                Ok(())
            },
        }
    }

    /// Resolve an [`ApprovalRequest`] via the registered callback, defaulting
    /// per [`Self::with_default_approve_on_missing_callback`] when none is
    /// registered.
    async fn request_approval(&self, request: &ApprovalRequest) -> ApprovalDecision {
        let callback = self.callback.read().await.clone();
        match callback {
            Some(callback) => callback.approve(request).await,
            None => {
                tracing::warn!(
                    tool_name = %request.tool_name,
                    approve_by_default = self.approve_on_missing_callback,
                    "no approval callback registered, applying configured default"
                );
                if self.approve_on_missing_callback {
                    ApprovalDecision::approve()
                } else {
                    ApprovalDecision::deny("no approval callback registered")
                }
            },
        }
    }

    /// Revoke a cached session approval for a tool. Returns `true` if one was
    /// present.
    pub async fn revoke_session_approval(&self, tool_name: &str) -> bool {
        let removed = self.approvals.write().await.remove(tool_name).is_some();
        if removed {
            tracing::info!(tool_name, "tool:revoked");
        }
        removed
    }

    /// Export the serializable approval state for persistence in the session
    /// payload.
    pub async fn export_state(&self) -> ApprovalState {
        ApprovalState {
            version: APPROVAL_STATE_VERSION,
            approvals: self.approvals.read().await.clone(),
            allowlist: self.allowlist.read().await.iter().cloned().collect(),
            blocklist: self.blocklist.read().await.iter().cloned().collect(),
        }
    }

    /// Restore approval state previously produced by [`Self::export_state`].
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::Internal`] if the state's schema version is
    /// newer than this manager understands.
    pub async fn import_state(&self, state: ApprovalState) -> ApprovalResult<()> {
        if state.version > APPROVAL_STATE_VERSION {
            return Err(ApprovalError::Internal(format!(
                "approval state version {} is newer than supported version {APPROVAL_STATE_VERSION}",
                state.version
            )));
        }
        *self.approvals.write().await = state.approvals;
        *self.allowlist.write().await = state.allowlist.into_iter().collect();
        *self.blocklist.write().await = state.blocklist.into_iter().collect();
        Ok(())
    }
}

impl std::fmt::Debug for PermissionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionManager")
            .field("default_scope", &self.default_scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AutoApprove;
    #[async_trait]
    impl ApprovalCallback for AutoApprove {
        async fn approve(&self, _request: &ApprovalRequest) -> ApprovalDecision {
            ApprovalDecision::approve()
        }
    }

    struct AutoApproveSession;
    #[async_trait]
    impl ApprovalCallback for AutoApproveSession {
        async fn approve(&self, _request: &ApprovalRequest) -> ApprovalDecision {
            ApprovalDecision::approve_with_scope(PermissionScope::Session)
        }
    }

    struct AutoDeny;
    #[async_trait]
    impl ApprovalCallback for AutoDeny {
        async fn approve(&self, _request: &ApprovalRequest) -> ApprovalDecision {
            ApprovalDecision::deny("denied by test")
        }
    }

    #[tokio::test]
    async fn blocklist_wins_over_allowlist() {
        let manager = PermissionManager::new(PermissionScope::Always);
        manager.allow("rm").await;
        manager.block("rm").await;

        let result = manager
            .check_permission("rm", &serde_json::json!({}), RiskLevel::High)
            .await;
        assert!(matches!(result, PermissionResult::Blocked { .. }));
    }

    #[tokio::test]
    async fn allowlist_bypasses_scope() {
        let manager = PermissionManager::new(PermissionScope::Never);
        manager.allow("read_file").await;

        let result = manager
            .check_permission("read_file", &serde_json::json!({}), RiskLevel::Low)
            .await;
        assert!(result.is_allowed());
    }

    #[tokio::test]
    async fn always_scope_allows() {
        let manager = PermissionManager::new(PermissionScope::Always);
        let result = manager
            .check_permission("echo", &serde_json::json!({}), RiskLevel::Low)
            .await;
        assert!(result.is_allowed());
    }

    #[tokio::test]
    async fn once_scope_always_needs_approval() {
        let manager = PermissionManager::new(PermissionScope::Once);
        let result = manager
            .check_permission("delete_file", &serde_json::json!({}), RiskLevel::High)
            .await;
        assert!(matches!(result, PermissionResult::NeedsApproval(_)));
    }

    #[tokio::test]
    async fn session_scope_caches_after_approval() {
        let manager = PermissionManager::new(PermissionScope::Session);
        manager.register_callback(Arc::new(AutoApproveSession)).await;

        manager
            .gate("write_file", &serde_json::json!({}), RiskLevel::High)
            .await
            .unwrap();

        let result = manager
            .check_permission("write_file", &serde_json::json!({}), RiskLevel::High)
            .await;
        assert!(result.is_allowed());
    }

    #[tokio::test]
    async fn gate_denies_when_callback_denies() {
        let manager = PermissionManager::new(PermissionScope::Once);
        manager.register_callback(Arc::new(AutoDeny)).await;

        let result = manager
            .gate("rm", &serde_json::json!({}), RiskLevel::High)
            .await;
        assert!(matches!(result, Err(ApprovalError::Denied { .. })));
    }

    #[tokio::test]
    async fn gate_approves_via_callback() {
        let manager = PermissionManager::new(PermissionScope::Once);
        manager.register_callback(Arc::new(AutoApprove)).await;

        let result = manager
            .gate("search", &serde_json::json!({}), RiskLevel::Low)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn missing_callback_defaults_to_approve() {
        let manager = PermissionManager::new(PermissionScope::Once);
        let result = manager
            .gate("search", &serde_json::json!({}), RiskLevel::Low)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn missing_callback_can_default_to_deny() {
        let manager = PermissionManager::new(PermissionScope::Once)
            .with_default_approve_on_missing_callback(false);
        let result = manager
            .gate("search", &serde_json::json!({}), RiskLevel::Low)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn revoke_session_approval_removes_cache() {
        let manager = PermissionManager::new(PermissionScope::Session);
        manager.register_callback(Arc::new(AutoApproveSession)).await;
        manager
            .gate("write_file", &serde_json::json!({}), RiskLevel::High)
            .await
            .unwrap();

        assert!(manager.revoke_session_approval("write_file").await);

        let result = manager
            .check_permission("write_file", &serde_json::json!({}), RiskLevel::High)
            .await;
        assert!(matches!(result, PermissionResult::NeedsApproval(_)));
    }

    #[tokio::test]
    async fn export_and_import_state_roundtrip() {
        let manager = PermissionManager::new(PermissionScope::Session);
        manager.allow("read_file").await;
        manager.block("rm").await;
        manager.register_callback(Arc::new(AutoApproveSession)).await;
        manager
            .gate("write_file", &serde_json::json!({}), RiskLevel::High)
            .await
            .unwrap();

        let state = manager.export_state().await;
        assert_eq!(state.version, APPROVAL_STATE_VERSION);
        assert!(state.allowlist.contains(&"read_file".to_string()));
        assert!(state.blocklist.contains(&"rm".to_string()));
        assert!(state.approvals.contains_key("write_file"));

        let restored = PermissionManager::new(PermissionScope::Session);
        restored.import_state(state).await.unwrap();
        let result = restored
            .check_permission("write_file", &serde_json::json!({}), RiskLevel::High)
            .await;
        assert!(result.is_allowed());
    }
}
