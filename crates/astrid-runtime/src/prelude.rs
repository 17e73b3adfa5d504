//! Prelude module - commonly used types for convenient import.
//!
//! Use `use astrid_runtime::prelude::*;` to import all essential types.

// Errors
pub use crate::{RuntimeError, RuntimeResult};

// Runtime
pub use crate::{AgentRuntime, RuntimeConfig};

// Sessions
pub use crate::AgentSession;
pub use crate::{SessionDocument, SessionStore};

// Context management
pub use crate::{AssembledContext, ContextManager, ContextStats};

// Memory plugins
pub use crate::{InContextMemoryPlugin, MemoryPlugin, Scope, Tier, WorkingMemoryPlugin};

// Sub-agents
pub use crate::{SubAgentExecutor, SubAgentHandle, SubAgentId, SubAgentPool, SubAgentStatus};

// Cancellation
pub use crate::CancelSignal;
