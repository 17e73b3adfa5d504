//! Astrid Runtime - the agentic loop and session lifecycle.
//!
//! This crate provides:
//! - [`AgentRuntime`], which drives one user turn across however many
//!   provider round-trips and tool dispatches it takes
//! - [`AgentSession`], the in-memory wrapper around a durable session
//!   document
//! - [`ContextManager`], assembling and compacting the conversation that
//!   gets sent to the provider each iteration
//! - [`SubAgentPool`] and [`SubAgentExecutor`], for the `task` tool's
//!   concurrency- and depth-bounded sub-agent spawning
//!
//! # Architecture
//!
//! The runtime coordinates a provider port, a tool manager and registry, a
//! permission manager, a hook manager, an event bus, an audit log, and a
//! session store. None of these are owned exclusively by the runtime; it
//! borrows them as `Arc`s so a process can share one audit log or session
//! store across several runtimes.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use astrid_approval::PermissionManager;
//! use astrid_approval::request::PermissionScope;
//! use astrid_audit::AuditLog;
//! use astrid_config::{ContextConfig, RunConfig};
//! use astrid_events::EventBus;
//! use astrid_hooks::HookManager;
//! use astrid_llm::EchoProvider;
//! use astrid_runtime::{AgentRuntime, AgentSession, RuntimeConfig};
//! use astrid_storage::MemorySessionStore;
//! use astrid_tools::ToolRegistry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = Arc::new(AgentRuntime::new(
//!     Arc::new(EchoProvider::new()),
//!     Arc::new(ToolRegistry::with_defaults()),
//!     Arc::new(PermissionManager::new(PermissionScope::Session)),
//!     Arc::new(HookManager::new()),
//!     Arc::new(MemorySessionStore::new()),
//!     Arc::new(EventBus::new()),
//!     Arc::new(AuditLog::in_memory()),
//!     PathBuf::from("."),
//!     RuntimeConfig {
//!         run: RunConfig::default(),
//!         context: ContextConfig::default(),
//!         retry: astrid_config::RetrySection::default(),
//!     },
//! ));
//!
//! let mut session = AgentSession::new("You are a helpful assistant.");
//! let answer = runtime
//!     .run(&mut session, "Hello!", astrid_runtime::CancelSignal::new(), None)
//!     .await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod config_bridge;
pub mod prelude;

mod cancel;
mod context;
mod error;
mod execution_context;
mod memory;
mod runtime;
mod session;
pub mod subagent;
pub mod subagent_executor;

pub use cancel::CancelSignal;
pub use context::{AssembledContext, CompactionOutcome, ConsolidationOutcome, ContextManager, ContextStats};
pub use error::{RuntimeError, RuntimeResult};
pub use execution_context::ExecutionContext;
pub use memory::{InContextMemoryPlugin, MemoryPlugin, MemoryStore, Scope, Tier, WorkingMemoryPlugin};
pub use runtime::{AgentRuntime, RuntimeConfig};
pub use session::AgentSession;
pub use subagent::{SubAgentHandle, SubAgentId, SubAgentPool, SubAgentPoolStats, SubAgentStatus};
pub use subagent_executor::SubAgentExecutor;

// Re-export session storage types for convenience.
pub use astrid_storage::{SessionDocument, SessionStore};

// Re-export tool types for convenience.
pub use astrid_tools::{self, ToolContext, ToolRegistry};
