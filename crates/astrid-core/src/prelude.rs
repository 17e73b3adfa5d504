//! Prelude module - commonly used types for convenient import.
//!
//! Use `use astrid_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Conversation data model
pub use crate::{
    unpaired_tool_call_ids, ContentBlock, ConversationItem, ImageDetail, ImageSource, Role,
};

// Tool descriptors
pub use crate::{
    ApprovalScope, ConcurrencySpec, IdempotencySpec, OutputSizeHint, PermissionSpec, RetryPolicy,
    ToolDescriptor,
};

// Hook events
pub use crate::HookEvent;

// Common scalar types
pub use crate::{sanitize_tool_name, RiskLevel, SessionId, Timestamp, ToolCallId};

// Retry utilities
pub use crate::{retry, RetryConfig, RetryOutcome};
