//! Hook executor - runs hooks with their handlers.

use chrono::Utc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::handler::{AgentHandler, CommandHandler};
use crate::hook::{Hook, HookFailureMode, HookHandler, HookMatcher};
use crate::result::{HookContext, HookExecution, HookExecutionResult, HookResult};

/// Executes hooks using the appropriate handler.
#[derive(Debug, Default)]
pub struct HookExecutor {
    command_handler: CommandHandler,
    agent_handler: AgentHandler,
}

impl HookExecutor {
    /// Create a new hook executor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a single hook.
    pub async fn execute(&self, hook: &Hook, context: &HookContext) -> HookExecution {
        let started_at = Utc::now();
        let timeout = Duration::from_secs(hook.timeout_secs);

        debug!(
            hook_id = %hook.id,
            hook_name = ?hook.name,
            event = %hook.event,
            "Executing hook"
        );

        if !hook.enabled {
            return HookExecution {
                hook_id: hook.id,
                invocation_id: context.invocation_id,
                started_at,
                completed_at: Utc::now(),
                duration_ms: 0,
                result: HookExecutionResult::Skipped {
                    reason: "hook is disabled".to_string(),
                },
            };
        }

        if let Some(ref matcher) = hook.matcher
            && !matches_context(matcher, context)
        {
            return HookExecution {
                hook_id: hook.id,
                invocation_id: context.invocation_id,
                started_at,
                completed_at: Utc::now(),
                duration_ms: 0,
                result: HookExecutionResult::Skipped {
                    reason: "matcher did not match".to_string(),
                },
            };
        }

        let result = match &hook.handler {
            HookHandler::Command { .. } => {
                self.command_handler
                    .execute(&hook.handler, context, timeout)
                    .await
            },
            HookHandler::Agent { .. } => {
                self.agent_handler
                    .execute(&hook.handler, context, timeout)
                    .await
            },
        };

        let completed_at = Utc::now();
        #[allow(clippy::cast_sign_loss)]
        #[allow(clippy::arithmetic_side_effects)]
        let duration_ms = (completed_at - started_at).num_milliseconds().max(0) as u64;

        let execution_result = match result {
            Ok(result) => {
                info!(
                    hook_id = %hook.id,
                    duration_ms = duration_ms,
                    "Hook executed successfully"
                );
                result
            },
            Err(e) => {
                error!(
                    hook_id = %hook.id,
                    error = %e,
                    "Hook execution failed"
                );
                HookExecutionResult::Failure {
                    error: e.to_string(),
                    stderr: None,
                }
            },
        };

        HookExecution {
            hook_id: hook.id,
            invocation_id: context.invocation_id,
            started_at,
            completed_at,
            duration_ms,
            result: execution_result,
        }
    }

    /// Execute multiple hooks in sequence, honoring each hook's failure
    /// mode (falling back to `default_failure_mode` when unset). Stops
    /// early on `Fail` or on any `Block` result.
    #[allow(clippy::missing_panics_doc)]
    pub async fn execute_all(
        &self,
        hooks: &[Hook],
        mut context: HookContext,
        default_failure_mode: HookFailureMode,
    ) -> Vec<HookExecution> {
        let mut executions = Vec::with_capacity(hooks.len());

        for hook in hooks {
            let execution = self.execute(hook, &context).await;

            if let Some(result) = execution.result.hook_result() {
                context.add_previous_result(result.clone());
            }

            if !execution.result.is_success() {
                match hook.fail_action.unwrap_or(default_failure_mode) {
                    HookFailureMode::Fail => {
                        warn!(
                            hook_id = %hook.id,
                            "Hook failed, aborting chain per hookFailureMode=fail"
                        );
                        executions.push(execution);
                        break;
                    },
                    HookFailureMode::Warn => {
                        warn!(hook_id = %hook.id, "Hook failed, continuing");
                    },
                    HookFailureMode::Ignore => {
                        debug!(hook_id = %hook.id, "Hook failed, continuing silently");
                    },
                }
            }

            if let Some(HookResult::Block { .. }) = execution.result.hook_result() {
                info!(
                    hook_id = %hook.id,
                    "Hook returned Block result, stopping chain"
                );
                executions.push(execution);
                break;
            }

            executions.push(execution);
        }

        executions
    }

    /// Combine multiple hook results into a single result.
    ///
    /// Rules:
    /// - Any Block result → Block
    /// - `ContinueWith` modifications are merged
    /// - Otherwise → Continue
    #[must_use]
    pub fn combine_results(executions: &[HookExecution]) -> HookResult {
        let mut modifications = std::collections::HashMap::new();

        for execution in executions {
            match execution.result.hook_result() {
                Some(HookResult::Block { reason }) => {
                    return HookResult::Block {
                        reason: reason.clone(),
                    };
                },
                Some(HookResult::ContinueWith {
                    modifications: mods,
                }) => {
                    modifications.extend(mods.clone());
                },
                Some(HookResult::Continue) | None => {},
            }
        }

        if !modifications.is_empty() {
            return HookResult::ContinueWith { modifications };
        }

        HookResult::Continue
    }
}

/// Check if a matcher matches the context.
fn matches_context(matcher: &HookMatcher, context: &HookContext) -> bool {
    match matcher {
        HookMatcher::Glob { pattern } => {
            if let Some(tool_name) = context.get_data_as::<String>("tool_name")
                && let Ok(glob) = globset::Glob::new(pattern)
            {
                let matcher = glob.compile_matcher();
                return matcher.is_match(&tool_name);
            }
            false
        },
        HookMatcher::Regex { pattern } => {
            if let Some(tool_name) = context.get_data_as::<String>("tool_name")
                && let Ok(re) = regex::Regex::new(pattern)
            {
                return re.is_match(&tool_name);
            }
            false
        },
        HookMatcher::ToolNames { names } => {
            if let Some(tool_name) = context.get_data_as::<String>("tool_name") {
                return names.contains(&tool_name);
            }
            false
        },
    }
}

/// Builder for `HookExecution` for testing.
#[derive(Debug)]
pub struct HookExecutionBuilder {
    hook_id: Uuid,
    invocation_id: Uuid,
    result: HookExecutionResult,
}

impl HookExecutionBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hook_id: Uuid::new_v4(),
            invocation_id: Uuid::new_v4(),
            result: HookExecutionResult::Success {
                result: HookResult::Continue,
                stdout: None,
            },
        }
    }

    /// Set the result.
    #[must_use]
    pub fn with_result(mut self, result: HookExecutionResult) -> Self {
        self.result = result;
        self
    }

    /// Build the execution.
    #[must_use]
    pub fn build(self) -> HookExecution {
        let now = Utc::now();
        HookExecution {
            hook_id: self.hook_id,
            invocation_id: self.invocation_id,
            started_at: now,
            completed_at: now,
            duration_ms: 0,
            result: self.result,
        }
    }
}

impl Default for HookExecutionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
