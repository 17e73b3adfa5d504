//! Configuration types for the Astrid runtime.
//!
//! All types in this module are self-contained with no dependencies on other
//! internal astrid crates. Domain types (`ApprovalScope`, `RiskLevel`) are
//! mirrored here as config-local enums and converted at the boundary by the
//! crate that actually builds a run. Every struct implements [`Default`] with
//! sensible production defaults so that a bare `[section]` header in TOML
//! produces a working configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration for the Astrid runtime.
///
/// Loaded from layered TOML files (system, user, workspace) with environment
/// variable overrides. Every section defaults to safe, production-ready
/// values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run-level model selection, loop limits, and error handling.
    pub run: RunConfig,
    /// Permission-level approval scopes, allow/block lists, per-tool overrides.
    pub permissions: PermissionConfig,
    /// Context-level compaction strategy and token estimation.
    pub context: ContextConfig,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
    /// Retry behaviour for transient provider and tool failures.
    pub retry: RetrySection,
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Run-level configuration: model selection, loop limits, error handling.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Model identifier sent to the provider. Required at the run boundary;
    /// the default here is a placeholder that `validate` rejects if unchanged
    /// and no override was supplied by any layer.
    pub model: String,
    /// System instructions for the run. `None` lets the caller supply its own.
    #[serde(skip_serializing)]
    pub instructions: Option<String>,
    /// Sampling temperature passed to the provider.
    pub temperature: f64,
    /// Maximum number of agentic-loop iterations before `IterationLimitExceeded`.
    pub max_iterations: u32,
    /// Wall-clock execution budget in milliseconds. `None` is unbounded.
    pub max_execution_ms: Option<u64>,
    /// Aggregate tool-call budget across all iterations. `None` is unbounded.
    pub max_tool_calls: Option<u32>,
    /// Maximum assembled input messages before oldest-first trimming.
    pub max_input_messages: Option<u32>,
    /// Which items `ContextManager.assemble` includes by default.
    pub history_mode: HistoryMode,
    /// Provider-specific passthrough options (e.g. vendor sampling knobs).
    pub vendor_options: HashMap<String, toml::Value>,
    /// Hook names enabled for this run, in registration order.
    pub hooks: Vec<String>,
    /// Error propagation policy for hook and tool failures.
    pub error_handling: ErrorHandlingConfig,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("model", &self.model)
            .field("has_instructions", &self.instructions.is_some())
            .field("temperature", &self.temperature)
            .field("max_iterations", &self.max_iterations)
            .field("max_execution_ms", &self.max_execution_ms)
            .field("max_tool_calls", &self.max_tool_calls)
            .field("max_input_messages", &self.max_input_messages)
            .field("history_mode", &self.history_mode)
            .field("vendor_options", &self.vendor_options)
            .field("hooks", &self.hooks)
            .field("error_handling", &self.error_handling)
            .finish()
    }
}

impl Serialize for RunConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("RunConfig", 9)?;
        state.serialize_field("model", &self.model)?;
        state.serialize_field("temperature", &self.temperature)?;
        state.serialize_field("max_iterations", &self.max_iterations)?;
        state.serialize_field("max_execution_ms", &self.max_execution_ms)?;
        state.serialize_field("max_tool_calls", &self.max_tool_calls)?;
        state.serialize_field("max_input_messages", &self.max_input_messages)?;
        state.serialize_field("history_mode", &self.history_mode)?;
        state.serialize_field("vendor_options", &self.vendor_options)?;
        state.serialize_field("hooks", &self.hooks)?;
        state.serialize_field("error_handling", &self.error_handling)?;
        state.end()
    }
}

impl PartialEq for RunConfig {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model
            && self.instructions == other.instructions
            && self.temperature == other.temperature
            && self.max_iterations == other.max_iterations
            && self.max_execution_ms == other.max_execution_ms
            && self.max_tool_calls == other.max_tool_calls
            && self.max_input_messages == other.max_input_messages
            && self.history_mode == other.history_mode
            && self.vendor_options == other.vendor_options
            && self.hooks == other.hooks
            && self.error_handling == other.error_handling
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_owned(),
            instructions: None,
            temperature: 0.7,
            max_iterations: 10,
            max_execution_ms: None,
            max_tool_calls: None,
            max_input_messages: None,
            history_mode: HistoryMode::Full,
            vendor_options: HashMap::new(),
            hooks: Vec::new(),
            error_handling: ErrorHandlingConfig::default(),
        }
    }
}

/// Which items `ContextManager.assemble` includes when building the next
/// provider request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryMode {
    /// Send the full assembled conversation.
    #[default]
    Full,
    /// Send a pre-compacted conversation.
    Compacted,
    /// Mix recent full-fidelity turns with compacted older turns.
    Hybrid,
}

/// Error propagation policy for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorHandlingConfig {
    /// What happens when a `before`/`after` hook fails.
    pub hook_failure_mode: HookFailureMode,
    /// What happens when a tool call returns an error.
    pub tool_failure_mode: ToolFailureMode,
    /// Consecutive failures of the same tool before the run fails.
    pub max_consecutive_errors: u32,
}

impl Default for ErrorHandlingConfig {
    fn default() -> Self {
        Self {
            hook_failure_mode: HookFailureMode::Warn,
            tool_failure_mode: ToolFailureMode::Continue,
            max_consecutive_errors: 3,
        }
    }
}

/// Policy applied when a hook raises an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookFailureMode {
    /// Fail the run immediately.
    Fail,
    /// Log the failure and continue as if the hook had not run.
    Warn,
    /// Silently continue.
    Ignore,
}

/// Policy applied when a tool call returns an error result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolFailureMode {
    /// Fail the run on the first tool error.
    Fail,
    /// Surface the error to the model and continue the loop.
    Continue,
}

// ---------------------------------------------------------------------------
// PermissionConfig
// ---------------------------------------------------------------------------

/// Permission-level configuration: default gating, allow/block lists, and
/// per-tool overrides.
///
/// `on-approval-required` is a runtime callback, not a static value, and has
/// no representation here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionConfig {
    /// Scope applied to a tool that has no allowlist/blocklist/per-tool entry.
    pub default_scope: ApprovalScopeConfig,
    /// Risk classification applied to a tool with no explicit risk override.
    pub default_risk: RiskLevelConfig,
    /// Tool names always allowed without approval.
    pub allowlist: Vec<String>,
    /// Tool names always blocked.
    pub blocklist: Vec<String>,
    /// Per-tool overrides, keyed by tool name.
    pub per_tool: HashMap<String, PerToolPermissionConfig>,
}

/// Mirrors the domain `ApprovalScope`/`PermissionScope` so that the config
/// crate stays dependency-free.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalScopeConfig {
    /// Allowed without approval.
    Always,
    /// Approved once, cached for the session (optional TTL).
    Session,
    /// Approval requested on every call.
    #[default]
    Once,
    /// Blocked unconditionally.
    Never,
}

/// Mirrors the domain `RiskLevel` so that the config crate stays
/// dependency-free.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevelConfig {
    /// Read-only or fully reversible.
    Low,
    /// Default risk for unclassified tools.
    #[default]
    Medium,
    /// Irreversible or data-modifying.
    High,
    /// Destructive or capable of unbounded damage.
    Critical,
}

/// Per-tool permission override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerToolPermissionConfig {
    /// Scope override for this tool.
    pub scope: Option<ApprovalScopeConfig>,
    /// Risk override for this tool.
    pub risk: Option<RiskLevelConfig>,
    /// Message shown in the approval prompt for this tool.
    pub approval_message: Option<String>,
    /// Session-scoped approval TTL in milliseconds.
    pub session_ttl_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// ContextConfig
// ---------------------------------------------------------------------------

/// Context-level configuration: compaction strategy selection and
/// strategy-specific tuning, plus token estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Which built-in compaction strategy to run.
    pub compaction_strategy_name: CompactionStrategyName,
    /// Fraction of `effective-cap` at which assembly logs a warning but does
    /// not yet compact.
    pub warning_threshold: f64,
    /// Fraction of `effective-cap` at which `DefaultRolling` triggers.
    pub rolling_threshold: f64,
    /// Fraction of `effective-cap` at which `AlgorithmicToolOffload` triggers.
    pub tool_offload_threshold: f64,
    /// Byte size above which a tool result is offloaded to working memory.
    pub result_size_threshold_bytes: u64,
    /// Maximum retained tool-call pairs before oldest-excess pairs are
    /// removed.
    pub tool_pair_cap: u32,
    /// Which token estimator to use for budget accounting.
    pub token_estimator: TokenEstimatorConfig,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            compaction_strategy_name: CompactionStrategyName::default(),
            warning_threshold: 0.70,
            rolling_threshold: 0.70,
            tool_offload_threshold: 0.75,
            result_size_threshold_bytes: 1024,
            tool_pair_cap: 10,
            token_estimator: TokenEstimatorConfig::default(),
        }
    }
}

/// Selects which built-in compaction strategy a `ContextManager` runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompactionStrategyName {
    /// Compact plugins first, then remove oldest conversation items,
    /// preserving tool-call pairs.
    #[default]
    DefaultRolling,
    /// Offload oversized tool results to working memory, then cap retained
    /// tool-call pairs.
    AlgorithmicToolOffload,
}

/// Selects the token estimator used for budget accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenEstimatorConfig {
    /// `ceil(chars / 3.5)` for text, tile-based estimate for images.
    #[default]
    Default,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging level, output format, and per-crate tracing directives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"` (human-friendly), `"compact"` (one-line),
    /// `"json"` (structured), or `"full"` (verbose).
    pub format: String,
    /// Per-crate tracing directives (e.g. `["astrid_runtime=debug",
    /// "hyper=warn"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// RetrySection
// ---------------------------------------------------------------------------

/// Retry behaviour for transient provider and tool failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Maximum retry attempts for provider requests.
    pub llm_max_attempts: u32,
    /// Maximum retry attempts for tool invocations.
    pub tool_max_attempts: u32,
    /// Initial retry delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum retry delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            llm_max_attempts: 3,
            tool_max_attempts: 2,
            initial_delay_ms: 100,
            max_delay_ms: 10_000,
        }
    }
}
