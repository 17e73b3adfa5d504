//! Prelude module - commonly used types for convenient import.
//!
//! Use `use astrid_audit::prelude::*;` to import the essential types.

pub use crate::{AuditAction, AuditEntry, AuditError, AuditLog, AuditOutcome, AuditResult};
