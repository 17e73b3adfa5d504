//! Task tool — spawns a sub-agent to carry out a self-contained task.

use std::time::Duration;

use crate::subagent_spawner::SubAgentRequest;
use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};
use serde_json::Value;

/// Built-in tool that delegates a task to a freshly spawned sub-agent.
///
/// Requires a [`crate::SubAgentSpawner`] to be set on the [`ToolContext`]
/// (the runtime installs one at the start of each turn); absent a spawner
/// the tool fails with [`ToolError::ExecutionFailed`].
pub struct TaskTool;

#[async_trait::async_trait]
impl BuiltinTool for TaskTool {
    fn name(&self) -> &'static str {
        "task"
    }

    fn description(&self) -> &'static str {
        "Delegates a self-contained task to a sub-agent and returns its final output. \
         Use for focused, independently verifiable work that does not need to share \
         context with the parent conversation."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "description": {
                    "type": "string",
                    "description": "Short description of the task (shown in logs)"
                },
                "prompt": {
                    "type": "string",
                    "description": "Detailed instructions for the sub-agent"
                },
                "timeout_ms": {
                    "type": "integer",
                    "description": "Optional timeout in milliseconds"
                }
            },
            "required": ["description", "prompt"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let description = args
            .get("description")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("description is required".into()))?
            .to_string();

        let prompt = args
            .get("prompt")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("prompt is required".into()))?
            .to_string();

        let timeout = args
            .get("timeout_ms")
            .and_then(Value::as_u64)
            .map(Duration::from_millis);

        let spawner = ctx.subagent_spawner().await.ok_or_else(|| {
            ToolError::ExecutionFailed("no sub-agent spawner configured".to_string())
        })?;

        let result = spawner
            .spawn(SubAgentRequest {
                description,
                prompt,
                timeout,
            })
            .await
            .map_err(ToolError::ExecutionFailed)?;

        if result.success {
            Ok(result.output)
        } else {
            Err(ToolError::ExecutionFailed(
                result.error.unwrap_or_else(|| "sub-agent failed".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subagent_spawner::{SubAgentResult, SubAgentSpawner};
    use std::sync::Arc;

    struct StubSpawner {
        result: SubAgentResult,
    }

    #[async_trait::async_trait]
    impl SubAgentSpawner for StubSpawner {
        async fn spawn(&self, _request: SubAgentRequest) -> Result<SubAgentResult, String> {
            Ok(self.result.clone())
        }
    }

    #[tokio::test]
    async fn test_task_without_spawner_fails() {
        let ctx = ToolContext::new(std::env::temp_dir());
        let result = TaskTool
            .execute(
                serde_json::json!({"description": "d", "prompt": "p"}),
                &ctx,
            )
            .await;

        assert!(matches!(result, Err(ToolError::ExecutionFailed(_))));
    }

    #[tokio::test]
    async fn test_task_returns_subagent_output() {
        let ctx = ToolContext::new(std::env::temp_dir());
        ctx.set_subagent_spawner(Some(Arc::new(StubSpawner {
            result: SubAgentResult {
                success: true,
                output: "done".to_string(),
                duration_ms: 10,
                tool_calls: 2,
                error: None,
            },
        })))
        .await;

        let result = TaskTool
            .execute(
                serde_json::json!({"description": "d", "prompt": "p"}),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(result, "done");
    }

    #[tokio::test]
    async fn test_task_propagates_subagent_failure() {
        let ctx = ToolContext::new(std::env::temp_dir());
        ctx.set_subagent_spawner(Some(Arc::new(StubSpawner {
            result: SubAgentResult {
                success: false,
                output: String::new(),
                duration_ms: 10,
                tool_calls: 0,
                error: Some("boom".to_string()),
            },
        })))
        .await;

        let result = TaskTool
            .execute(
                serde_json::json!({"description": "d", "prompt": "p"}),
                &ctx,
            )
            .await;

        assert!(matches!(result, Err(ToolError::ExecutionFailed(msg)) if msg == "boom"));
    }
}
