//! Reference tools used by the worked examples and the demo binary.
//!
//! None of these touch the filesystem or network; they exist purely to
//! drive [`crate::ToolManager`] and the agentic loop end to end against
//! [`astrid_llm::EchoProvider`] without real side effects.

use std::time::Duration;

use astrid_core::IdempotencySpec;
use serde_json::Value;

use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

/// Returns its `message` argument unchanged.
pub struct EchoTool;

#[async_trait::async_trait]
impl BuiltinTool for EchoTool {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn description(&self) -> &'static str {
        "Returns the message argument unchanged."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {"message": {"type": "string"}},
            "required": ["message"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        args.get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ToolError::InvalidArguments("message is required".into()))
    }

    fn idempotency(&self) -> IdempotencySpec {
        IdempotencySpec { safe: true, ttl_ms: None }
    }
}

/// Adds two numbers.
pub struct AddTool;

#[async_trait::async_trait]
impl BuiltinTool for AddTool {
    fn name(&self) -> &'static str {
        "add"
    }

    fn description(&self) -> &'static str {
        "Adds two numbers and returns the sum."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "a": {"type": "number"},
                "b": {"type": "number"}
            },
            "required": ["a", "b"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let a = args
            .get("a")
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolError::InvalidArguments("a is required".into()))?;
        let b = args
            .get("b")
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolError::InvalidArguments("b is required".into()))?;
        Ok((a + b).to_string())
    }

    fn idempotency(&self) -> IdempotencySpec {
        IdempotencySpec { safe: true, ttl_ms: None }
    }
}

/// Sleeps for the given number of milliseconds, then returns `"awake"`.
///
/// Used to exercise timeout and cancellation handling: give it a
/// `duration_ms` longer than the caller's patience.
pub struct SleepTool;

#[async_trait::async_trait]
impl BuiltinTool for SleepTool {
    fn name(&self) -> &'static str {
        "sleep"
    }

    fn description(&self) -> &'static str {
        "Sleeps for duration_ms milliseconds, then returns."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {"duration_ms": {"type": "integer"}},
            "required": ["duration_ms"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let duration_ms = args
            .get("duration_ms")
            .and_then(Value::as_u64)
            .ok_or_else(|| ToolError::InvalidArguments("duration_ms is required".into()))?;
        tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        Ok("awake".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir())
    }

    #[tokio::test]
    async fn echo_returns_message() {
        let result = EchoTool
            .execute(serde_json::json!({"message": "hi"}), &ctx())
            .await
            .unwrap();
        assert_eq!(result, "hi");
    }

    #[tokio::test]
    async fn add_sums_arguments() {
        let result = AddTool
            .execute(serde_json::json!({"a": 2, "b": 3}), &ctx())
            .await
            .unwrap();
        assert_eq!(result, "5");
    }

    #[tokio::test]
    async fn sleep_returns_after_duration() {
        let result = SleepTool
            .execute(serde_json::json!({"duration_ms": 1}), &ctx())
            .await
            .unwrap();
        assert_eq!(result, "awake");
    }
}
