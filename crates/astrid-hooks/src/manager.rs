//! `HookManager` - registers hooks and runs them at the seven loop hook
//! points (§4.6).
//!
//! Hooks are registered in insertion order, then run in ascending
//! `priority` order within a hook point (ties preserve registration
//! order — the sort is stable). A hook point's run produces a single
//! combined [`HookResult`]; `Block` short-circuits the rest of the chain.

use std::collections::HashMap;

use crate::config::HooksConfig;
use crate::discovery::discover_hooks;
use crate::executor::HookExecutor;
use crate::hook::{Hook, HookEvent, HookFailureMode};
use crate::result::{HookContext, HookExecution, HookResult};

/// Registers and runs hooks for the loop's seven hook points.
#[derive(Debug)]
pub struct HookManager {
    hooks: HashMap<HookEvent, Vec<Hook>>,
    executor: HookExecutor,
    default_failure_mode: HookFailureMode,
}

impl HookManager {
    /// Create an empty manager with a given default failure mode.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: HashMap::new(),
            executor: HookExecutor::new(),
            default_failure_mode: HookFailureMode::Warn,
        }
    }

    /// Build a manager from configuration, optionally discovering hooks
    /// from disk.
    #[must_use]
    pub fn from_config(config: HooksConfig) -> Self {
        let mut manager = Self {
            hooks: HashMap::new(),
            executor: HookExecutor::new(),
            default_failure_mode: config.default_failure_mode,
        };

        for hook in config.hooks {
            manager.register(hook);
        }

        if config.discover_on_load {
            let extra = (!config.extra_discovery_paths.is_empty())
                .then_some(config.extra_discovery_paths.as_slice());
            for hook in discover_hooks(extra) {
                manager.register(hook);
            }
        }

        manager
    }

    /// Register a hook. Hooks for the same event are kept sorted by
    /// priority (ascending, stable).
    pub fn register(&mut self, hook: Hook) {
        let bucket = self.hooks.entry(hook.event).or_default();
        bucket.push(hook);
        bucket.sort_by_key(|h| h.priority);
    }

    /// Remove every hook with the given id. Returns `true` if one was
    /// removed.
    pub fn unregister(&mut self, id: uuid::Uuid) -> bool {
        let mut removed = false;
        for bucket in self.hooks.values_mut() {
            let before = bucket.len();
            bucket.retain(|h| h.id != id);
            removed |= bucket.len() != before;
        }
        removed
    }

    /// Hooks registered for a given event, in run order.
    #[must_use]
    pub fn hooks_for(&self, event: HookEvent) -> &[Hook] {
        self.hooks.get(&event).map_or(&[], Vec::as_slice)
    }

    /// Run every hook registered for `context.event`, returning the
    /// combined result and the individual executions (for audit logging).
    pub async fn trigger(&self, context: HookContext) -> (HookResult, Vec<HookExecution>) {
        let event = context.event;
        let hooks = self.hooks_for(event).to_vec();
        if hooks.is_empty() {
            return (HookResult::Continue, Vec::new());
        }

        let executions = self
            .executor
            .execute_all(&hooks, context, self.default_failure_mode)
            .await;
        let combined = HookExecutor::combine_results(&executions);
        (combined, executions)
    }

    /// Convenience wrapper for hook points whose result is only used for
    /// its blocking/non-blocking outcome (`before:iteration`,
    /// `after:iteration`, `before:compact`, `after:compact`).
    pub async fn trigger_simple(&self, event: HookEvent) -> HookResult {
        self.trigger(HookContext::new(event)).await.0
    }
}

impl Default for HookManager {
    fn default() -> Self {
        Self::new()
    }
}
