//! Astrid Audit - a plain structured audit trail for the agentic loop.
//!
//! Every security-relevant operation (tool calls, permission checks, hook
//! firings, provider requests, compaction, session lifecycle) is appended
//! to an [`AuditLog`] as a numbered [`AuditEntry`]. Entries live in a
//! bounded in-memory ring and, optionally, an append-only newline-delimited
//! JSON file sink for durability across restarts.
//!
//! # Example
//!
//! ```
//! use astrid_audit::{AuditAction, AuditLog, AuditOutcome};
//! use astrid_core::SessionId;
//!
//! let log = AuditLog::in_memory();
//! let session_id = SessionId::new();
//!
//! let entry = log
//!     .append(
//!         session_id.clone(),
//!         AuditAction::SessionStarted {
//!             frontend: "cli".to_string(),
//!         },
//!         AuditOutcome::success(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(entry.sequence, 0);
//! assert_eq!(log.session_entries(&session_id).len(), 1);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod entry;
mod error;
mod log;

pub use entry::{AuditAction, AuditEntry, AuditOutcome};
pub use error::{AuditError, AuditResult};
pub use log::AuditLog;
