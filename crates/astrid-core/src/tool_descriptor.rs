//! Tool descriptor types (data model §3).

use serde::{Deserialize, Serialize};

use crate::ids::RiskLevel;

/// How long an approval grant for a tool remains valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalScope {
    /// Approval is requested on every call.
    Once,
    /// Approved once, valid for the rest of the session (optionally with a
    /// TTL).
    Session,
    /// Allowed without approval.
    Always,
    /// Blocked unconditionally.
    Never,
}

/// Permission metadata attached to a tool descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionSpec {
    /// Default approval scope for this tool.
    pub scope: ApprovalScope,
    /// Risk classification shown in approval prompts.
    pub risk: RiskLevel,
    /// Human-readable message shown when approval is requested.
    pub approval_message: Option<String>,
}

impl Default for PermissionSpec {
    fn default() -> Self {
        Self {
            scope: ApprovalScope::Once,
            risk: RiskLevel::Medium,
            approval_message: None,
        }
    }
}

/// Concurrency policy for a tool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConcurrencySpec {
    /// Maximum number of concurrent in-flight calls to this tool.
    pub max_concurrent: usize,
    /// Whether this tool holds the manager-wide blocking lock while it runs.
    pub blocking: bool,
}

impl Default for ConcurrencySpec {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            blocking: false,
        }
    }
}

/// Idempotency / caching policy for a tool.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IdempotencySpec {
    /// Whether calling this tool twice with equal arguments is safe to
    /// short-circuit via the idempotency cache.
    pub safe: bool,
    /// How long a cached result remains fresh, in milliseconds.
    pub ttl_ms: Option<u64>,
}

/// A coarse hint about how large a tool's output tends to be, used by
/// compaction strategies to prioritize offload candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSizeHint {
    /// A few bytes to a few hundred bytes.
    Small,
    /// Size depends on input; no strong prior.
    Variable,
    /// Routinely large (file contents, search results, etc.).
    Large,
}

/// Retry policy a tool may opt into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Initial backoff before the first retry, in milliseconds.
    pub backoff_initial_ms: u64,
    /// Multiplicative backoff factor applied after each retry.
    pub backoff_factor: f64,
}

/// Full static description of a tool, as registered with the `ToolManager`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique name, matching `[A-Za-z0-9_-]+` after sanitation.
    pub name: String,
    /// JSON Schema describing accepted arguments.
    pub parameters_schema: serde_json::Value,
    /// Human-readable description shown to the model.
    pub description: String,
    /// Permission metadata.
    pub permission: PermissionSpec,
    /// Concurrency policy.
    pub concurrency: ConcurrencySpec,
    /// Idempotency / caching policy.
    pub idempotency: IdempotencySpec,
    /// Expected output size class.
    pub output_size_hint: OutputSizeHint,
    /// Hard timeout for a single execution, in milliseconds.
    pub timeout_ms: u64,
    /// Optional retry policy; absent means no automatic retries.
    pub retry: Option<RetryPolicy>,
}

impl ToolDescriptor {
    /// Construct a descriptor with permissive defaults, suitable as a
    /// starting point for builder-style customization.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters_schema: serde_json::json!({"type": "object"}),
            description: description.into(),
            permission: PermissionSpec::default(),
            concurrency: ConcurrencySpec::default(),
            idempotency: IdempotencySpec::default(),
            output_size_hint: OutputSizeHint::Variable,
            timeout_ms: 30_000,
            retry: None,
        }
    }

    /// Set the JSON schema.
    #[must_use]
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.parameters_schema = schema;
        self
    }

    /// Set the permission spec.
    #[must_use]
    pub fn with_permission(mut self, permission: PermissionSpec) -> Self {
        self.permission = permission;
        self
    }

    /// Set the concurrency spec.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: ConcurrencySpec) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the idempotency spec.
    #[must_use]
    pub fn with_idempotency(mut self, idempotency: IdempotencySpec) -> Self {
        self.idempotency = idempotency;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }
}
