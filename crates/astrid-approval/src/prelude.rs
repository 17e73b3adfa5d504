//! Prelude module - commonly used types for convenient import.
//!
//! Use `use astrid_approval::prelude::*;` to import the essential types.

pub use crate::{
    ApprovalCallback, ApprovalDecision, ApprovalError, ApprovalRequest, ApprovalResult,
    PermissionManager, PermissionResult, PermissionScope, RequestId,
};
