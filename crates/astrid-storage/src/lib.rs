//! Astrid Storage — persistence layer for agentic session state.
//!
//! A session's durable state is a single [`SessionDocument`]: the ordered
//! conversation, the approval subsystem's allow/block lists and cached
//! session approvals, plugin-private state, and an execution-metrics
//! snapshot. [`SessionStore`] is the narrow trait that persists and
//! restores that document; [`MemorySessionStore`] and [`FileSessionStore`]
//! are the two backends provided here.
//!
//! A store is expected to provide at-least-once durability: a crash between
//! a successful `save` and the runtime's next checkpoint may replay the last
//! persisted iteration boundary, but never silently loses a document that
//! `save` reported as written.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
mod file;
mod memory;
pub mod session;

pub use error::{StorageError, StorageResult};
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use session::{
    ExecutionMetricsSnapshot, SessionDocument, SessionStore, SESSION_DOCUMENT_VERSION,
};
