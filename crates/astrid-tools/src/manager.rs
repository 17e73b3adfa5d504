//! `ToolManager` — the tool call execution pipeline (§4.2).
//!
//! Lookup, argument validation, permission gating, idempotency cache,
//! circuit breaker, concurrency admission, timeout, retry, cache store, and
//! event emission, in that order. A single call goes through
//! [`ToolManager::execute`]; a batch of calls from one provider turn goes
//! through [`ToolManager::execute_batch`], which preserves the caller's
//! ordering in the returned slice regardless of completion order.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use astrid_approval::PermissionManager;
use astrid_core::{ApprovalScope, SessionId};
use astrid_events::{AstridEvent, EventBus, EventMetadata};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{Mutex, Semaphore};

use crate::{BuiltinTool, ToolContext, ToolError, ToolRegistry, ToolResult};

/// Default cap on the number of cached idempotent results kept in memory.
const DEFAULT_CACHE_CAPACITY: usize = 512;
/// Initial circuit breaker cooldown after a tool first trips open.
const INITIAL_COOLDOWN_MS: u64 = 1_000;
/// Upper bound on cooldown doubling, so a persistently broken tool does not
/// lock itself out for longer than this.
const MAX_COOLDOWN_MS: u64 = 5 * 60 * 1_000;
/// Consecutive failures before a tool's circuit trips open.
const FAILURE_THRESHOLD: u32 = 3;

/// Maps a tool descriptor's gating scope onto the approval subsystem's own
/// scope type. The two enums carry the same four cases; they stay separate
/// types because [`astrid_approval::PermissionManager`] persists its scope
/// map independently of tool registration.
fn to_permission_scope(scope: ApprovalScope) -> astrid_approval::PermissionScope {
    match scope {
        ApprovalScope::Once => astrid_approval::PermissionScope::Once,
        ApprovalScope::Session => astrid_approval::PermissionScope::Session,
        ApprovalScope::Always => astrid_approval::PermissionScope::Always,
        ApprovalScope::Never => astrid_approval::PermissionScope::Never,
    }
}

/// A single tool call requested by the provider.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Tool name.
    pub name: String,
    /// Provider-assigned call id, echoed back in the result.
    pub call_id: String,
    /// Arguments as parsed from the provider's tool-call payload.
    pub arguments: Value,
}

/// The outcome of running a single [`ToolCall`] through the manager.
#[derive(Debug, Clone)]
pub struct ToolCallResult {
    /// The originating call id.
    pub call_id: String,
    /// Tool output, or an error message if `is_error` is set.
    pub output: String,
    /// Whether `output` carries an error message rather than a result.
    pub is_error: bool,
    /// Wall-clock duration of the call, excluding queue wait time.
    pub duration_ms: u64,
    /// Whether this result was served from the idempotency cache.
    pub cached: bool,
}

impl ToolCallResult {
    fn ok(call_id: String, output: String, duration_ms: u64, cached: bool) -> Self {
        Self {
            call_id,
            output,
            is_error: false,
            duration_ms,
            cached,
        }
    }

    fn err(call_id: String, message: String, duration_ms: u64) -> Self {
        Self {
            call_id,
            output: message,
            is_error: true,
            duration_ms,
            cached: false,
        }
    }
}

/// State of a per-tool circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through normally.
    Closed,
    /// Calls fail fast until the cooldown elapses.
    Open,
    /// One probe call is allowed through to test recovery.
    HalfOpen,
}

struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    cooldown_ms: u64,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            cooldown_ms: INITIAL_COOLDOWN_MS,
        }
    }
}

impl Circuit {
    fn admit(&mut self) -> Result<(), Duration> {
        match self.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let elapsed = self.opened_at.map_or(Duration::MAX, |t| t.elapsed());
                let cooldown = Duration::from_millis(self.cooldown_ms);
                if elapsed >= cooldown {
                    self.state = CircuitState::HalfOpen;
                    Ok(())
                } else {
                    Err(cooldown - elapsed)
                }
            },
        }
    }

    fn record_success(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.cooldown_ms = INITIAL_COOLDOWN_MS;
        self.opened_at = None;
    }

    fn record_failure(&mut self) {
        match self.state {
            CircuitState::HalfOpen => {
                self.cooldown_ms = (self.cooldown_ms * 2).min(MAX_COOLDOWN_MS);
                self.state = CircuitState::Open;
                self.opened_at = Some(Instant::now());
            },
            CircuitState::Closed | CircuitState::Open => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= FAILURE_THRESHOLD {
                    self.state = CircuitState::Open;
                    self.opened_at = Some(Instant::now());
                }
            },
        }
    }
}

#[derive(Clone)]
struct CacheEntry {
    result: String,
    is_error: bool,
    expires_at: Option<Instant>,
}

/// Runs tool calls through the full execution pipeline: lookup, validation,
/// permission gating, idempotency cache, circuit breaker, concurrency
/// admission, timeout, retry, cache store, and event emission.
pub struct ToolManager {
    registry: Arc<ToolRegistry>,
    permissions: Arc<PermissionManager>,
    events: Option<Arc<EventBus>>,
    session_id: SessionId,
    sequence: AtomicU64,
    circuits: DashMap<String, Circuit>,
    semaphores: DashMap<String, Arc<Semaphore>>,
    blocking_lock: Arc<Mutex<()>>,
    cache: DashMap<String, CacheEntry>,
    cache_order: Mutex<VecDeque<String>>,
    cache_capacity: usize,
    scope_registered: DashMap<String, ()>,
}

impl ToolManager {
    /// Create a manager wrapping `registry`, gated by `permissions`, for the
    /// given session. Events are dropped unless [`Self::with_events`] is
    /// called.
    #[must_use]
    pub fn new(
        registry: Arc<ToolRegistry>,
        permissions: Arc<PermissionManager>,
        session_id: SessionId,
    ) -> Self {
        Self {
            registry,
            permissions,
            events: None,
            session_id,
            sequence: AtomicU64::new(0),
            circuits: DashMap::new(),
            semaphores: DashMap::new(),
            blocking_lock: Arc::new(Mutex::new(())),
            cache: DashMap::new(),
            cache_order: Mutex::new(VecDeque::new()),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            scope_registered: DashMap::new(),
        }
    }

    /// Attach an event bus; every lifecycle step emits an `AstridEvent`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Override the idempotency cache's LRU capacity.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    fn emit(&self, event: AstridEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    fn metadata(&self) -> EventMetadata {
        EventMetadata::new(self.session_id, self.sequence.fetch_add(1, Ordering::SeqCst))
    }

    /// Execute a single tool call through the full pipeline.
    pub async fn execute(&self, call: ToolCall, ctx: &ToolContext) -> ToolCallResult {
        let start = Instant::now();

        // Step 1: lookup.
        let Some(tool) = self.registry.get(&call.name) else {
            return ToolCallResult::err(
                call.call_id,
                ToolError::Other(format!("tool not found: {}", call.name)).to_string(),
                elapsed_ms(start),
            );
        };

        self.emit(AstridEvent::ToolDetected {
            metadata: self.metadata(),
            name: call.name.clone(),
        });

        // Step 2: argument validation against the tool's JSON schema.
        if let Err(message) = validate_arguments(&tool.input_schema(), &call.arguments) {
            return ToolCallResult::err(call.call_id, message, elapsed_ms(start));
        }

        // Step 3: permission gate. A tool's declared scope seeds the
        // permission manager's scope map the first time it is seen; later
        // approvals (e.g. a user granting session-scoped trust) take over
        // from there.
        let permission = tool.permission();
        if self.scope_registered.insert(call.name.clone(), ()).is_none() {
            self.permissions
                .set_tool_scope(call.name.clone(), to_permission_scope(permission.scope))
                .await;
        }
        if let Err(e) = self
            .permissions
            .gate(&call.name, &call.arguments, permission.risk)
            .await
        {
            self.emit(AstridEvent::ToolDenied {
                metadata: self.metadata(),
                name: call.name.clone(),
                reason: e.to_string(),
            });
            return ToolCallResult::err(call.call_id, e.to_string(), elapsed_ms(start));
        }
        self.emit(AstridEvent::ToolApproved {
            metadata: self.metadata(),
            name: call.name.clone(),
        });

        // Step 4: idempotency cache lookup.
        let idempotency = tool.idempotency();
        let cacheable = idempotency.safe || idempotency.ttl_ms.is_some_and(|ttl| ttl > 0);
        let fingerprint = cacheable.then(|| fingerprint(&call.name, &call.arguments));

        if let Some(fp) = &fingerprint
            && let Some(entry) = self.cache.get(fp)
            && entry.expires_at.is_none_or(|exp| exp > Instant::now())
        {
            self.emit(AstridEvent::ToolCached {
                metadata: self.metadata(),
                name: call.name.clone(),
            });
            return if entry.is_error {
                ToolCallResult::err(call.call_id, entry.result.clone(), elapsed_ms(start))
            } else {
                ToolCallResult::ok(call.call_id, entry.result.clone(), elapsed_ms(start), true)
            };
        }

        // Step 5: circuit breaker admission.
        {
            let mut circuit = self.circuits.entry(call.name.clone()).or_default();
            if let Err(remaining) = circuit.admit() {
                return ToolCallResult::err(
                    call.call_id,
                    format!(
                        "circuit open for '{}', retry in {}ms",
                        call.name,
                        remaining.as_millis()
                    ),
                    elapsed_ms(start),
                );
            }
        }

        // Step 6: concurrency admission.
        let concurrency = tool.concurrency();
        let semaphore = self
            .semaphores
            .entry(call.name.clone())
            .or_insert_with(|| Arc::new(Semaphore::new(concurrency.max_concurrent)))
            .clone();
        let _permit = semaphore.acquire_owned().await;
        let _blocking_guard = if concurrency.blocking {
            Some(self.blocking_lock.lock().await)
        } else {
            None
        };

        // Step 7 + 8: timeout race, with optional retry.
        self.emit(AstridEvent::ToolStart {
            metadata: self.metadata(),
            name: call.name.clone(),
        });

        let timeout_ms = tool.timeout_ms();
        let attempt_result = self
            .run_with_timeout(tool, &call.arguments, ctx, timeout_ms)
            .await;

        let duration_ms = elapsed_ms(start);

        match attempt_result {
            Ok(output) => {
                self.circuits.entry(call.name.clone()).or_default().record_success();
                self.emit(AstridEvent::ToolComplete {
                    metadata: self.metadata(),
                    name: call.name.clone(),
                    duration_ms,
                });

                // Step 9: cache store.
                if let Some(fp) = fingerprint {
                    self.store_cache_entry(fp, output.clone(), false, idempotency.ttl_ms)
                        .await;
                }

                ToolCallResult::ok(call.call_id, output, duration_ms, false)
            },
            Err(ToolError::Timeout(ms)) => {
                self.circuits.entry(call.name.clone()).or_default().record_failure();
                self.emit(AstridEvent::ToolTimeout {
                    metadata: self.metadata(),
                    name: call.name.clone(),
                });
                ToolCallResult::err(
                    call.call_id,
                    format!("tool '{}' timed out after {ms}ms", call.name),
                    duration_ms,
                )
            },
            Err(e) => {
                self.circuits.entry(call.name.clone()).or_default().record_failure();
                self.emit(AstridEvent::ToolError {
                    metadata: self.metadata(),
                    name: call.name.clone(),
                    message: e.to_string(),
                });
                ToolCallResult::err(call.call_id, e.to_string(), duration_ms)
            },
        }
    }

    /// Execute every call in `calls` concurrently, preserving the input
    /// order in the returned `Vec` regardless of completion order.
    pub async fn execute_batch(
        &self,
        calls: Vec<ToolCall>,
        ctx: &ToolContext,
    ) -> Vec<ToolCallResult> {
        let futures = calls.into_iter().map(|call| self.execute(call, ctx));
        futures::future::join_all(futures).await
    }

    async fn run_with_timeout(
        &self,
        tool: &dyn BuiltinTool,
        args: &Value,
        ctx: &ToolContext,
        timeout_ms: u64,
    ) -> ToolResult {
        match tokio::time::timeout(Duration::from_millis(timeout_ms), tool.execute(args.clone(), ctx))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout(timeout_ms)),
        }
    }

    async fn store_cache_entry(&self, fingerprint: String, result: String, is_error: bool, ttl_ms: Option<u64>) {
        let expires_at = ttl_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
        self.cache.insert(
            fingerprint.clone(),
            CacheEntry {
                result,
                is_error,
                expires_at,
            },
        );

        let mut order = self.cache_order.lock().await;
        order.push_back(fingerprint);
        while order.len() > self.cache_capacity {
            if let Some(oldest) = order.pop_front() {
                self.cache.remove(&oldest);
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Stable fingerprint over `(tool name, canonical-json args)` for the
/// idempotency cache.
fn fingerprint(name: &str, args: &Value) -> String {
    let canonical = canonicalize(args);
    let mut hasher = blake3::Hasher::new();
    hasher.update(name.as_bytes());
    hasher.update(b"\0");
    hasher.update(canonical.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Serialize a `Value` with object keys sorted recursively, so semantically
/// identical arguments hash identically regardless of field order.
fn canonicalize(value: &Value) -> String {
    fn sort(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                let mut sorted = serde_json::Map::new();
                for (k, v) in entries {
                    sorted.insert(k.clone(), sort(v));
                }
                Value::Object(sorted)
            },
            Value::Array(items) => Value::Array(items.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    serde_json::to_string(&sort(value)).unwrap_or_default()
}

/// Lightweight structural validation: checks required properties are
/// present and that present properties match their declared JSON type.
fn validate_arguments(schema: &Value, args: &Value) -> Result<(), String> {
    let Some(schema_obj) = schema.as_object() else {
        return Ok(());
    };

    if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
        for field in required {
            let Some(field_name) = field.as_str() else {
                continue;
            };
            if args.get(field_name).is_none() {
                return Err(format!("missing required argument: {field_name}"));
            }
        }
    }

    let Some(properties) = schema_obj.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (key, prop_schema) in properties {
        let Some(value) = args.get(key) else { continue };
        let Some(expected_type) = prop_schema.get("type").and_then(Value::as_str) else {
            continue;
        };
        if !matches_json_type(value, expected_type) {
            return Err(format!(
                "argument '{key}' expected type '{expected_type}', path: properties.{key}.type"
            ));
        }
    }

    Ok(())
}

fn matches_json_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BuiltinTool, ToolContext, ToolRegistry, ToolResult};
    use astrid_approval::PermissionScope;
    use astrid_core::IdempotencySpec;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct EchoTool;

    #[async_trait]
    impl BuiltinTool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn description(&self) -> &'static str {
            "echoes the message argument"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": {"message": {"type": "string"}},
                "required": ["message"]
            })
        }
        async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
            Ok(args.get("message").and_then(Value::as_str).unwrap_or("").to_string())
        }
        fn idempotency(&self) -> IdempotencySpec {
            IdempotencySpec { safe: true, ttl_ms: None }
        }
    }

    struct TtlOnlyTool {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BuiltinTool for TtlOnlyTool {
        fn name(&self) -> &'static str {
            "ttl_only"
        }
        fn description(&self) -> &'static str {
            "not declared safe, but carries an explicit ttl-ms"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _args: Value, _ctx: &ToolContext) -> ToolResult {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(n.to_string())
        }
        fn idempotency(&self) -> IdempotencySpec {
            IdempotencySpec { safe: false, ttl_ms: Some(60_000) }
        }
    }

    struct SleepTool;

    #[async_trait]
    impl BuiltinTool for SleepTool {
        fn name(&self) -> &'static str {
            "sleep"
        }
        fn description(&self) -> &'static str {
            "sleeps past its own timeout"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _args: Value, _ctx: &ToolContext) -> ToolResult {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok("done".to_string())
        }
        fn timeout_ms(&self) -> u64 {
            10
        }
    }

    struct FlakyTool {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BuiltinTool for FlakyTool {
        fn name(&self) -> &'static str {
            "flaky"
        }
        fn description(&self) -> &'static str {
            "always fails, to exercise the circuit breaker"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _args: Value, _ctx: &ToolContext) -> ToolResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ToolError::ExecutionFailed("boom".to_string()))
        }
    }

    fn test_manager(registry: ToolRegistry) -> ToolManager {
        let permissions = Arc::new(PermissionManager::new(PermissionScope::Always));
        ToolManager::new(Arc::new(registry), permissions, SessionId::new())
    }

    fn test_ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir())
    }

    #[tokio::test]
    async fn unknown_tool_fails_lookup() {
        let manager = test_manager(ToolRegistry::new());
        let ctx = test_ctx();
        let result = manager
            .execute(
                ToolCall {
                    name: "nonexistent".to_string(),
                    call_id: "1".to_string(),
                    arguments: serde_json::json!({}),
                },
                &ctx,
            )
            .await;
        assert!(result.is_error);
        assert!(result.output.contains("not found"));
    }

    #[tokio::test]
    async fn missing_required_argument_fails_validation() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let manager = test_manager(registry);
        let ctx = test_ctx();

        let result = manager
            .execute(
                ToolCall {
                    name: "echo".to_string(),
                    call_id: "1".to_string(),
                    arguments: serde_json::json!({}),
                },
                &ctx,
            )
            .await;

        assert!(result.is_error);
        assert!(result.output.contains("missing required argument"));
    }

    #[tokio::test]
    async fn successful_call_returns_output() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let manager = test_manager(registry);
        let ctx = test_ctx();

        let result = manager
            .execute(
                ToolCall {
                    name: "echo".to_string(),
                    call_id: "1".to_string(),
                    arguments: serde_json::json!({"message": "hi"}),
                },
                &ctx,
            )
            .await;

        assert!(!result.is_error);
        assert_eq!(result.output, "hi");
        assert!(!result.cached);
    }

    #[tokio::test]
    async fn idempotent_call_is_served_from_cache() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let manager = test_manager(registry);
        let ctx = test_ctx();

        let call = || ToolCall {
            name: "echo".to_string(),
            call_id: "1".to_string(),
            arguments: serde_json::json!({"message": "hi"}),
        };

        let first = manager.execute(call(), &ctx).await;
        assert!(!first.cached);

        let second = manager.execute(call(), &ctx).await;
        assert!(second.cached);
        assert_eq!(second.output, "hi");
    }

    #[tokio::test]
    async fn unsafe_tool_with_explicit_ttl_is_still_cached() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(TtlOnlyTool { calls: AtomicUsize::new(0) }));
        let manager = test_manager(registry);
        let ctx = test_ctx();

        let call = || ToolCall { name: "ttl_only".to_string(), call_id: "1".to_string(), arguments: serde_json::json!({}) };

        let first = manager.execute(call(), &ctx).await;
        assert!(!first.cached);
        assert_eq!(first.output, "1");

        let second = manager.execute(call(), &ctx).await;
        assert!(second.cached);
        assert_eq!(second.output, "1");
    }

    #[tokio::test]
    async fn timeout_fails_the_call() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(SleepTool));
        let manager = test_manager(registry);
        let ctx = test_ctx();

        let result = manager
            .execute(
                ToolCall {
                    name: "sleep".to_string(),
                    call_id: "1".to_string(),
                    arguments: serde_json::json!({}),
                },
                &ctx,
            )
            .await;

        assert!(result.is_error);
        assert!(result.output.contains("timed out"));
    }

    #[tokio::test]
    async fn circuit_opens_after_repeated_failures() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FlakyTool { calls: AtomicUsize::new(0) }));
        let manager = test_manager(registry);
        let ctx = test_ctx();

        for _ in 0..FAILURE_THRESHOLD {
            let result = manager
                .execute(
                    ToolCall {
                        name: "flaky".to_string(),
                        call_id: "1".to_string(),
                        arguments: serde_json::json!({}),
                    },
                    &ctx,
                )
                .await;
            assert!(result.is_error);
        }

        let result = manager
            .execute(
                ToolCall {
                    name: "flaky".to_string(),
                    call_id: "1".to_string(),
                    arguments: serde_json::json!({}),
                },
                &ctx,
            )
            .await;

        assert!(result.output.contains("circuit open"));
    }

    #[tokio::test]
    async fn batch_preserves_call_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let manager = test_manager(registry);
        let ctx = test_ctx();

        let calls = vec![
            ToolCall { name: "echo".to_string(), call_id: "a".to_string(), arguments: serde_json::json!({"message": "1"}) },
            ToolCall { name: "echo".to_string(), call_id: "b".to_string(), arguments: serde_json::json!({"message": "2"}) },
            ToolCall { name: "echo".to_string(), call_id: "c".to_string(), arguments: serde_json::json!({"message": "3"}) },
        ];

        let results = manager.execute_batch(calls, &ctx).await;
        let ids: Vec<_> = results.iter().map(|r| r.call_id.clone()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    struct NeverTool;

    #[async_trait]
    impl BuiltinTool for NeverTool {
        fn name(&self) -> &'static str {
            "never"
        }
        fn description(&self) -> &'static str {
            "declares a never-approved scope, regardless of the manager's default"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _args: Value, _ctx: &ToolContext) -> ToolResult {
            Ok("should not run".to_string())
        }
        fn permission(&self) -> astrid_core::PermissionSpec {
            astrid_core::PermissionSpec {
                scope: astrid_core::ApprovalScope::Never,
                risk: astrid_core::RiskLevel::Low,
                approval_message: None,
            }
        }
    }

    #[tokio::test]
    async fn declared_scope_is_seeded_into_the_permission_manager() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(NeverTool));
        // Default scope is Always, but NeverTool declares Never for itself.
        let manager = test_manager(registry);
        let ctx = test_ctx();

        let result = manager
            .execute(
                ToolCall {
                    name: "never".to_string(),
                    call_id: "1".to_string(),
                    arguments: serde_json::json!({}),
                },
                &ctx,
            )
            .await;

        assert!(result.is_error);
    }
}
