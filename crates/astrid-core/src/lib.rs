//! Astrid Core - shared data-model types for the agentic control plane.
//!
//! This crate provides:
//! - Conversation items and content blocks (§3 data model)
//! - Tool descriptor types shared by `astrid-tools` and `astrid-approval`
//! - The `HookEvent` enum shared by `astrid-hooks` and `astrid-runtime`
//! - Identifier and risk-level scalar types
//! - Retry utilities with exponential backoff

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod conversation;
pub mod error;
pub mod hook_event;
pub mod ids;
pub mod retry;
pub mod sanitize;
pub mod tool_descriptor;

pub use conversation::{unpaired_tool_call_ids, ContentBlock, ConversationItem, ImageDetail, ImageSource, Role};
pub use error::{CoreError, CoreResult};
pub use hook_event::HookEvent;
pub use ids::{RiskLevel, SessionId, Timestamp, ToolCallId};
pub use retry::{retry, RetryConfig, RetryOutcome};
pub use sanitize::sanitize_tool_name;
pub use tool_descriptor::{
    ApprovalScope, ConcurrencySpec, IdempotencySpec, OutputSizeHint, PermissionSpec, RetryPolicy,
    ToolDescriptor,
};
