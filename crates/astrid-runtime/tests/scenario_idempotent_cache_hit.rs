//! Two sequential calls to a `safe` tool with identical arguments: the
//! second is served from the idempotency cache and the tool body runs
//! exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use astrid_approval::request::PermissionScope;
use astrid_approval::PermissionManager;
use astrid_core::{IdempotencySpec, SessionId};
use astrid_tools::{BuiltinTool, ToolCall, ToolContext, ToolManager, ToolRegistry, ToolResult};
use serde_json::Value;

/// Counts how many times its body actually ran.
struct CountingTool {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl BuiltinTool for CountingTool {
    fn name(&self) -> &'static str {
        "count"
    }

    fn description(&self) -> &'static str {
        "Increments a shared counter and returns the new value."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value, _ctx: &ToolContext) -> ToolResult {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(n.to_string())
    }

    fn idempotency(&self) -> IdempotencySpec {
        IdempotencySpec { safe: true, ttl_ms: Some(60_000) }
    }
}

#[tokio::test]
async fn second_identical_call_is_served_from_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CountingTool { calls: Arc::clone(&calls) }));

    let permissions = Arc::new(PermissionManager::new(PermissionScope::Always));
    let manager = ToolManager::new(Arc::new(registry), permissions, SessionId::new());
    let ctx = ToolContext::new(std::env::temp_dir());

    let call = || ToolCall { name: "count".to_owned(), call_id: "call-1".to_owned(), arguments: serde_json::json!({}) };

    let first = manager.execute(call(), &ctx).await;
    assert!(!first.is_error);
    assert_eq!(first.output, "1");
    assert!(!first.cached);

    let second = manager.execute(call(), &ctx).await;
    assert!(!second.is_error);
    assert_eq!(second.output, "1");
    assert!(second.cached);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
