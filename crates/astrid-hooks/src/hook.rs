//! Hook definitions and types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// Re-export HookEvent from astrid-core (canonical location, §4.6).
pub use astrid_core::HookEvent;

/// Handler implementation for a hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum HookHandler {
    /// Execute a shell command.
    Command {
        /// The command to execute.
        command: String,
        /// Arguments to pass to the command.
        #[serde(default)]
        args: Vec<String>,
        /// Environment variables to set.
        #[serde(default)]
        env: HashMap<String, String>,
        /// Working directory for the command.
        #[serde(default)]
        working_dir: Option<String>,
    },
    /// Invoke an LLM-based agent handler (stubbed - no provider wired yet).
    Agent {
        /// Agent prompt template.
        prompt_template: String,
        /// Model to use.
        #[serde(default)]
        model: Option<String>,
        /// Maximum tokens for response.
        #[serde(default)]
        max_tokens: Option<u32>,
    },
}

impl HookHandler {
    /// Create a new command handler.
    #[must_use]
    pub fn command(command: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
        }
    }

    /// Create a new agent handler (stubbed).
    #[must_use]
    pub fn agent(prompt_template: impl Into<String>) -> Self {
        Self::Agent {
            prompt_template: prompt_template.into(),
            model: None,
            max_tokens: None,
        }
    }

    /// Check if this handler is stubbed (not yet implemented).
    #[must_use]
    pub fn is_stubbed(&self) -> bool {
        matches!(self, Self::Agent { .. })
    }
}

/// Action to take when a hook fails to execute or returns an error, per
/// `hookFailureMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookFailureMode {
    /// Abort the operation that triggered the hook.
    Fail,
    /// Log a warning and continue with unmutated inputs.
    #[default]
    Warn,
    /// Silently continue with unmutated inputs.
    Ignore,
}

impl fmt::Display for HookFailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Warn => write!(f, "warn"),
            Self::Ignore => write!(f, "ignore"),
        }
    }
}

/// A hook definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hook {
    /// Unique identifier for this hook.
    pub id: Uuid,
    /// Human-readable name.
    #[serde(default)]
    pub name: Option<String>,
    /// Description of what this hook does.
    #[serde(default)]
    pub description: Option<String>,
    /// Event that triggers this hook.
    pub event: HookEvent,
    /// Optional matcher pattern (glob, regex, or explicit tool names).
    #[serde(default)]
    pub matcher: Option<HookMatcher>,
    /// Handler implementation.
    pub handler: HookHandler,
    /// Timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Failure mode override; when unset the manager's configured default
    /// applies.
    #[serde(default)]
    pub fail_action: Option<HookFailureMode>,
    /// Whether the hook is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Priority (lower runs first); hooks at the same priority run in
    /// registration order.
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_timeout() -> u64 {
    30
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i32 {
    100
}

impl Hook {
    /// Create a new hook for the given event.
    #[must_use]
    pub fn new(event: HookEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            description: None,
            event,
            matcher: None,
            handler: HookHandler::command("echo"),
            timeout_secs: 30,
            fail_action: None,
            enabled: true,
            priority: 100,
        }
    }

    /// Set the hook's name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the hook's description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the handler for this hook.
    #[must_use]
    pub fn with_handler(mut self, handler: HookHandler) -> Self {
        self.handler = handler;
        self
    }

    /// Set a matcher pattern.
    #[must_use]
    pub fn with_matcher(mut self, matcher: HookMatcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Override the failure mode for this hook specifically.
    #[must_use]
    pub fn with_fail_action(mut self, action: HookFailureMode) -> Self {
        self.fail_action = Some(action);
        self
    }

    /// Disable the hook.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Matcher for filtering when a hook should run, based on the tool name
/// involved (only meaningful for `before:tool`/`after:tool`/`approve:tool`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum HookMatcher {
    /// Match using a glob pattern.
    Glob {
        /// The glob pattern.
        pattern: String,
    },
    /// Match using a regex pattern.
    Regex {
        /// The regex pattern.
        pattern: String,
    },
    /// Match specific tool names.
    ToolNames {
        /// List of tool names to match.
        names: Vec<String>,
    },
}

impl HookMatcher {
    /// Create a glob matcher.
    #[must_use]
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self::Glob {
            pattern: pattern.into(),
        }
    }

    /// Create a regex matcher.
    #[must_use]
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex {
            pattern: pattern.into(),
        }
    }

    /// Create a tool names matcher.
    #[must_use]
    pub fn tools(names: Vec<String>) -> Self {
        Self::ToolNames { names }
    }
}
