//! The session document and the trait that persists it.

use std::collections::HashMap;

use astrid_approval::ApprovalState;
use astrid_core::{ConversationItem, SessionId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;

/// Current on-disk/in-memory schema version for [`SessionDocument`].
///
/// Bump this and add a migration path in [`SessionStore`] implementations
/// when the document shape changes.
pub const SESSION_DOCUMENT_VERSION: u32 = 1;

/// Point-in-time counters for a session's agentic loop, mirrored from the
/// runtime's execution context at each checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionMetricsSnapshot {
    /// Number of completed LLM calls.
    pub llm_calls: u64,
    /// Total input tokens across all LLM calls.
    pub llm_tokens_in: u64,
    /// Total output tokens across all LLM calls.
    pub llm_tokens_out: u64,
    /// Number of tool calls dispatched.
    pub tool_calls: u64,
    /// Number of tool calls that returned an error.
    pub tool_errors: u64,
    /// Number of context compactions performed.
    pub compactions: u64,
}

/// The complete durable state of one agentic session.
///
/// Everything a runtime needs to resume a session after a restart lives
/// here: the conversation history, the approval subsystem's state (so a
/// user's `session`-scoped approvals survive a restart), a free-form
/// per-plugin state map, and the last execution-metrics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDocument {
    /// Schema version this document was written with.
    pub version: u32,
    /// Ordered conversation items, oldest first.
    pub conversation: Vec<ConversationItem>,
    /// Approval allow/block lists and cached session approvals.
    pub approval_state: ApprovalState,
    /// Per-plugin opaque state, keyed by plugin name.
    pub plugin_state: HashMap<String, serde_json::Value>,
    /// Execution metrics as of `last_checkpoint`.
    pub metrics: ExecutionMetricsSnapshot,
    /// When this document was last written.
    pub last_checkpoint: Timestamp,
}

impl SessionDocument {
    /// Builds a fresh document for a new session: empty conversation,
    /// default approval state, no plugin state, zeroed metrics.
    #[must_use]
    pub fn new(checkpoint: Timestamp) -> Self {
        Self {
            version: SESSION_DOCUMENT_VERSION,
            conversation: Vec::new(),
            approval_state: ApprovalState::default(),
            plugin_state: HashMap::new(),
            metrics: ExecutionMetricsSnapshot::default(),
            last_checkpoint: checkpoint,
        }
    }
}

/// Persists and restores [`SessionDocument`]s keyed by [`SessionId`].
///
/// Implementations need not support concurrent writers to the same
/// session; the runtime serializes checkpoints per session.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session's document, or `None` if no session with this id
    /// has ever been saved.
    async fn load(&self, id: SessionId) -> StorageResult<Option<SessionDocument>>;

    /// Writes (overwrites) a session's document.
    async fn save(&self, id: SessionId, document: &SessionDocument) -> StorageResult<()>;

    /// Removes a session's document, if any. Not an error if absent.
    async fn delete(&self, id: SessionId) -> StorageResult<()>;
}
