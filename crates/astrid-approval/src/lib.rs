//! Astrid Approval - tool-call permission gating for the agentic loop.
//!
//! [`PermissionManager`] implements the allow/block list and per-tool scope
//! model described for the `ToolManager`'s permission gate: `always` tools
//! run without approval, `session` tools are approved once and cached for
//! the rest of the run, `once` tools are approved on every call, and `never`
//! tools are blocked unconditionally. A registered [`ApprovalCallback`]
//! resolves `NeedsApproval` results; with no callback registered the
//! manager defaults to approving (configurable) and logs the fact.
//!
//! # Example
//!
//! ```
//! use astrid_approval::{ApprovalDecision, PermissionManager, PermissionScope};
//! use astrid_core::RiskLevel;
//!
//! # async fn run() {
//! let manager = PermissionManager::new(PermissionScope::Always);
//! manager.block("rm").await;
//!
//! let result = manager
//!     .check_permission("rm", &serde_json::json!({"args": ["-rf", "/"]}), RiskLevel::Critical)
//!     .await;
//! assert!(!result.is_allowed());
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod error;
pub mod manager;
pub mod request;

pub use error::{ApprovalError, ApprovalResult};
pub use manager::{ApprovalCallback, ApprovalState, PermissionManager, PermissionResult, SessionApproval};
pub use request::{ApprovalDecision, ApprovalRequest, PermissionScope, RequestId};
