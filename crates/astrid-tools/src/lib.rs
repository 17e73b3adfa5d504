#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Built-in coding tools and the tool execution pipeline for the agentic loop.
//!
//! Provides a small illustrative set of tools as direct Rust function calls
//! (not MCP) for the hot-path coding operations: read, write, edit, search,
//! execute, list, and sub-agent delegation. [`ToolManager`] wraps a
//! [`ToolRegistry`] with the full execution pipeline: permission gating,
//! idempotency caching, circuit breaking, concurrency admission, timeouts,
//! retries, and event emission.

mod bash;
pub mod demo;
mod edit_file;
mod glob;
mod grep;
mod instructions;
mod list_directory;
pub mod manager;
mod read_file;
mod subagent_spawner;
mod system_prompt;
mod task;
mod truncate;
mod write_file;

pub use bash::BashTool;
pub use edit_file::EditFileTool;
pub use glob::GlobTool;
pub use grep::GrepTool;
pub use instructions::load_project_instructions;
pub use list_directory::ListDirectoryTool;
pub use manager::{CircuitState, ToolCall, ToolCallResult, ToolManager};
pub use read_file::ReadFileTool;
pub use subagent_spawner::{SubAgentRequest, SubAgentResult, SubAgentSpawner};
pub use system_prompt::build_system_prompt;
pub use task::TaskTool;
pub use truncate::truncate_at_char_boundary;
pub use write_file::WriteFileTool;

use astrid_core::{
    ApprovalScope, ConcurrencySpec, IdempotencySpec, OutputSizeHint, PermissionSpec, RetryPolicy,
    RiskLevel,
};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Maximum output size in characters before truncation.
const MAX_OUTPUT_CHARS: usize = 30_000;

/// A built-in tool that executes directly in-process.
#[async_trait::async_trait]
pub trait BuiltinTool: Send + Sync {
    /// Tool name (no colons — distinguishes from MCP "server:tool" format).
    ///
    /// Must match `[A-Za-z0-9_-]+`; the runtime sanitizes names that
    /// violate this before registration.
    fn name(&self) -> &'static str;

    /// Human-readable description for the LLM.
    fn description(&self) -> &'static str;

    /// JSON schema for tool input parameters.
    fn input_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult;

    /// Permission requirements for this tool. Defaults to `always`/low-risk
    /// (safe, no-approval-needed tools like reads) — deliberately more
    /// permissive than [`PermissionSpec::default`], whose `once`/medium
    /// default suits hand-built descriptors rather than this registry's
    /// common case.
    fn permission(&self) -> PermissionSpec {
        PermissionSpec {
            scope: ApprovalScope::Always,
            risk: RiskLevel::Low,
            approval_message: None,
        }
    }

    /// Concurrency limits for this tool. Defaults to unbounded, non-blocking
    /// — per-tool limits are opt-in, not [`ConcurrencySpec::default`]'s
    /// single-in-flight default.
    fn concurrency(&self) -> ConcurrencySpec {
        ConcurrencySpec { max_concurrent: usize::MAX, blocking: false }
    }

    /// Idempotency cache eligibility. Defaults to not cacheable.
    fn idempotency(&self) -> IdempotencySpec {
        IdempotencySpec::default()
    }

    /// Expected output size, used by the conversation assembler to budget
    /// context tokens. Defaults to `Variable`.
    fn output_size_hint(&self) -> OutputSizeHint {
        OutputSizeHint::Variable
    }

    /// Execution timeout. Defaults to 120 seconds.
    fn timeout_ms(&self) -> u64 {
        120_000
    }

    /// Opt-in retry policy. `None` means the manager never retries a failed
    /// call to this tool automatically.
    fn retry_policy(&self) -> Option<RetryPolicy> {
        None
    }
}

/// Shared context available to all built-in tools.
pub struct ToolContext {
    /// Workspace root directory.
    pub workspace_root: PathBuf,
    /// Current working directory (persists across bash invocations).
    pub cwd: Arc<RwLock<PathBuf>>,
    /// Sub-agent spawner (set by runtime before each turn, cleared after).
    subagent_spawner: RwLock<Option<Arc<dyn SubAgentSpawner>>>,
}

impl ToolContext {
    /// Create a new tool context rooted at `workspace_root`.
    #[must_use]
    pub fn new(workspace_root: PathBuf) -> Self {
        let cwd = Arc::new(RwLock::new(workspace_root.clone()));
        Self {
            workspace_root,
            cwd,
            subagent_spawner: RwLock::new(None),
        }
    }

    /// Create a per-turn tool context that shares the `cwd` with other turns
    /// but has its own independent spawner slot.
    ///
    /// This prevents concurrent sessions from racing on the spawner field
    /// while still sharing the working directory state.
    #[must_use]
    pub fn with_shared_cwd(workspace_root: PathBuf, cwd: Arc<RwLock<PathBuf>>) -> Self {
        Self {
            workspace_root,
            cwd,
            subagent_spawner: RwLock::new(None),
        }
    }

    /// Set the sub-agent spawner (called by runtime at turn start).
    pub async fn set_subagent_spawner(&self, spawner: Option<Arc<dyn SubAgentSpawner>>) {
        *self.subagent_spawner.write().await = spawner;
    }

    /// Get the sub-agent spawner (called by `TaskTool`).
    pub async fn subagent_spawner(&self) -> Option<Arc<dyn SubAgentSpawner>> {
        self.subagent_spawner.read().await.clone()
    }
}

/// Tool execution errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Path not found.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// Timeout.
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type for tool execution.
pub type ToolResult = Result<String, ToolError>;

/// Registry of built-in tools for lookup and LLM definition export.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn BuiltinTool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with all default tools registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ReadFileTool));
        registry.register(Box::new(WriteFileTool));
        registry.register(Box::new(EditFileTool));
        registry.register(Box::new(GlobTool));
        registry.register(Box::new(GrepTool));
        registry.register(Box::new(BashTool));
        registry.register(Box::new(ListDirectoryTool));
        registry.register(Box::new(TaskTool));
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: Box<dyn BuiltinTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Remove a registered tool by name.
    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn BuiltinTool>> {
        self.tools.remove(name)
    }

    /// Get a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn BuiltinTool> {
        self.tools.get(name).map(AsRef::as_ref)
    }

    /// Check if a name refers to a built-in tool (no colon = built-in).
    #[must_use]
    pub fn is_builtin(name: &str) -> bool {
        !name.contains(':')
    }

    /// Sanitize a raw tool name: non-`[A-Za-z0-9_-]` runs become a single
    /// `_`, a leading digit is prefixed with `n_`, and an empty result
    /// becomes `unnamed`.
    #[must_use]
    pub fn sanitize_name(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut last_was_sep = false;
        for ch in raw.chars() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                out.push(ch);
                last_was_sep = false;
            } else if !last_was_sep {
                out.push('_');
                last_was_sep = true;
            }
        }
        let out = out.trim_matches('_').to_string();
        if out.is_empty() {
            return "unnamed".to_string();
        }
        if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            format!("n_{out}")
        } else {
            out
        }
    }

    /// Export all tool definitions for the LLM.
    #[must_use]
    pub fn all_definitions(&self) -> Vec<astrid_llm::LlmToolDefinition> {
        self.tools
            .values()
            .map(|t| {
                astrid_llm::LlmToolDefinition::new(t.name())
                    .with_description(t.description())
                    .with_schema(t.input_schema())
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate output to stay within LLM context limits.
///
/// If `output` exceeds [`MAX_OUTPUT_CHARS`], it is truncated at a valid
/// `char` boundary and a notice is appended.
#[must_use]
pub fn truncate_output(output: String) -> String {
    if output.len() <= MAX_OUTPUT_CHARS {
        return output;
    }
    let mut truncated = truncate_at_char_boundary(&output, MAX_OUTPUT_CHARS);
    truncated.push_str("\n\n... (output truncated — exceeded 30000 character limit)");
    truncated
}

/// Classify a tool's approval risk from its name, for tools whose authors
/// have not set an explicit [`PermissionSpec`].
#[must_use]
pub fn default_risk_for(name: &str) -> RiskLevel {
    match name {
        "bash" => RiskLevel::High,
        "write_file" | "edit_file" => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_builtin() {
        assert!(ToolRegistry::is_builtin("read_file"));
        assert!(ToolRegistry::is_builtin("bash"));
        assert!(!ToolRegistry::is_builtin("filesystem:read_file"));
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = ToolRegistry::with_defaults();
        assert!(registry.get("read_file").is_some());
        assert!(registry.get("write_file").is_some());
        assert!(registry.get("edit_file").is_some());
        assert!(registry.get("glob").is_some());
        assert!(registry.get("grep").is_some());
        assert!(registry.get("bash").is_some());
        assert!(registry.get("list_directory").is_some());
        assert!(registry.get("task").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_all_definitions() {
        let registry = ToolRegistry::with_defaults();
        let defs = registry.all_definitions();
        assert_eq!(defs.len(), 8);
        for def in &defs {
            assert!(!def.name.contains(':'));
            assert!(def.description.is_some());
        }
    }

    #[test]
    fn test_truncate_output_small() {
        let small = "hello".to_string();
        assert_eq!(truncate_output(small.clone()), small);
    }

    #[test]
    fn test_truncate_output_large() {
        let large = "x".repeat(40_000);
        let result = truncate_output(large);
        assert!(result.len() < 40_000);
        assert!(result.contains("output truncated"));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(ToolRegistry::sanitize_name("read_file"), "read_file");
        assert_eq!(ToolRegistry::sanitize_name("filesystem:read"), "filesystem_read");
        assert_eq!(ToolRegistry::sanitize_name("9lives"), "n_9lives");
        assert_eq!(ToolRegistry::sanitize_name("!!!"), "unnamed");
    }
}
