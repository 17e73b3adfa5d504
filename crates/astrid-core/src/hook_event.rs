//! Hook point identifiers shared across crates.
//!
//! `HookEvent` lives in `astrid-core` so that `astrid-hooks` and
//! `astrid-runtime` can both reference it without creating a circular
//! dependency between the two.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Points in the agentic loop where registered hooks run (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEvent {
    /// Before a loop iteration begins; may rewrite instructions, temperature,
    /// or history mode.
    BeforeIteration,
    /// After a loop iteration's tool results have been appended.
    AfterIteration,
    /// Before a single tool call is dispatched to the `ToolManager`.
    BeforeTool,
    /// After a single tool call has returned (success or failure).
    AfterTool,
    /// When a `NeedsApproval` permission result is produced, before the
    /// configured approval callback runs.
    ApproveTool,
    /// Before a compaction strategy runs.
    BeforeCompact,
    /// After a compaction strategy has finished.
    AfterCompact,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BeforeIteration => "before:iteration",
            Self::AfterIteration => "after:iteration",
            Self::BeforeTool => "before:tool",
            Self::AfterTool => "after:tool",
            Self::ApproveTool => "approve:tool",
            Self::BeforeCompact => "before:compact",
            Self::AfterCompact => "after:compact",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_spec_naming() {
        assert_eq!(HookEvent::BeforeIteration.to_string(), "before:iteration");
        assert_eq!(HookEvent::ApproveTool.to_string(), "approve:tool");
    }
}
