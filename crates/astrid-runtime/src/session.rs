//! Agent session management.
//!
//! A session wraps the durable [`SessionDocument`] with the transient
//! bookkeeping an in-flight run needs but never persists: the live
//! [`ExecutionContext`], whether this session belongs to a sub-agent, and
//! dynamically fetched plugin context.

use astrid_core::SessionId;
use astrid_storage::SessionDocument;
use chrono::Utc;

use crate::execution_context::ExecutionContext;

/// An in-memory agent session, backed by a durable [`SessionDocument`].
#[derive(Debug)]
pub struct AgentSession {
    /// Unique session identifier.
    pub id: SessionId,
    /// The durable document: conversation, approval state, plugin state,
    /// and the metrics snapshot as of the last checkpoint.
    pub document: SessionDocument,
    /// System prompt for this session's runs.
    pub system_prompt: String,
    /// Model identifier override, if this session pins a specific model.
    pub model: Option<String>,
    /// Whether this session belongs to a sub-agent spawned by a tool (skips
    /// the top-level preamble the runtime prepends for root sessions).
    pub is_subagent: bool,
    /// Dynamically fetched plugin context, refreshed per iteration and
    /// never persisted.
    pub plugin_context: Option<String>,
    /// Live counters for the run currently using this session. Replaced
    /// with a fresh context restored from `document.metrics` whenever a
    /// session is reloaded from storage.
    pub execution: ExecutionContext,
}

impl AgentSession {
    /// Create a brand-new session with a freshly generated id.
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self::with_id(SessionId::new(), system_prompt)
    }

    /// Create a brand-new session with a specific id.
    #[must_use]
    pub fn with_id(id: SessionId, system_prompt: impl Into<String>) -> Self {
        Self {
            id,
            document: SessionDocument::new(Utc::now()),
            system_prompt: system_prompt.into(),
            model: None,
            is_subagent: false,
            plugin_context: None,
            execution: ExecutionContext::new(),
        }
    }

    /// Rehydrate a session from a previously persisted document.
    #[must_use]
    pub fn from_document(id: SessionId, document: SessionDocument, system_prompt: impl Into<String>) -> Self {
        let execution = ExecutionContext::from_snapshot(&document.metrics);
        Self {
            id,
            document,
            system_prompt: system_prompt.into(),
            model: None,
            is_subagent: false,
            plugin_context: None,
            execution,
        }
    }

    /// Create a child session for a sub-agent invocation. The child starts
    /// with an empty conversation and its own execution context; it shares
    /// nothing else with the parent (§4.7: outer and inner runs share only
    /// the provider port).
    #[must_use]
    pub fn child(system_prompt: impl Into<String>) -> Self {
        let mut child = Self::new(system_prompt);
        child.is_subagent = true;
        child
    }

    /// Stamp the current execution metrics and checkpoint time into the
    /// document, ready to be persisted by a `SessionStore`.
    pub fn checkpoint(&mut self) {
        self.document.metrics = self.execution.to_snapshot();
        self.document.last_checkpoint = Utc::now();
    }
}
