//! Hook system configuration (the `hooks` and `error-handling.hook-failure-mode`
//! keys of the run-level configuration surface, §6).

use serde::{Deserialize, Serialize};

use crate::hook::{Hook, HookFailureMode};

/// Configuration governing how the `HookManager` discovers and runs hooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Hooks registered directly (as opposed to discovered from disk).
    #[serde(default)]
    pub hooks: Vec<Hook>,
    /// Default failure mode applied to hooks with no per-hook override.
    #[serde(default)]
    pub default_failure_mode: HookFailureMode,
    /// Extra directories to search for hook definitions, beyond the
    /// workspace-local `.astrid/hooks`.
    #[serde(default)]
    pub extra_discovery_paths: Vec<std::path::PathBuf>,
    /// Whether to discover hooks from disk at manager construction time.
    #[serde(default)]
    pub discover_on_load: bool,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            hooks: Vec::new(),
            default_failure_mode: HookFailureMode::Warn,
            extra_discovery_paths: Vec::new(),
            discover_on_load: false,
        }
    }
}

impl HooksConfig {
    /// An empty configuration with no hooks and no discovery.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or doesn't match the
    /// expected shape.
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// Set the default failure mode.
    #[must_use]
    pub fn with_default_failure_mode(mut self, mode: HookFailureMode) -> Self {
        self.default_failure_mode = mode;
        self
    }

    /// Add a hook directly.
    #[must_use]
    pub fn with_hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }
}
