//! The audit/runtime event stream (§6 Audit event stream).

use std::fmt;

use astrid_core::SessionId;
use serde::{Deserialize, Serialize};

/// Metadata carried by every event: a monotonic-per-run sequence number and
/// an absolute timestamp, as required by §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// The run this event belongs to.
    pub run_id: SessionId,
    /// Monotonically increasing sequence number, scoped to `run_id`.
    pub sequence: u64,
    /// Absolute wall-clock timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl EventMetadata {
    /// Construct metadata for a given run and sequence number, stamped with
    /// the current time.
    #[must_use]
    pub fn new(run_id: SessionId, sequence: u64) -> Self {
        Self {
            run_id,
            sequence,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Status a run or iteration ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Completed normally.
    Completed,
    /// Failed with a classified error.
    Failed,
    /// Cancelled by the caller.
    Cancelled,
}

/// One event in the runtime's audit/telemetry stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AstridEvent {
    /// A run has started.
    RunStart {
        /// Event metadata.
        metadata: EventMetadata,
    },
    /// A run has ended.
    RunEnd {
        /// Event metadata.
        metadata: EventMetadata,
        /// Terminal status.
        status: RunStatus,
    },
    /// An iteration has started.
    IterationStart {
        /// Event metadata.
        metadata: EventMetadata,
        /// 1-indexed iteration number.
        iteration: u32,
    },
    /// An iteration has completed.
    IterationComplete {
        /// Event metadata.
        metadata: EventMetadata,
        /// 1-indexed iteration number.
        iteration: u32,
        /// Tool calls made during this iteration.
        tool_calls: usize,
    },
    /// A provider request is about to be sent.
    ProviderRequest {
        /// Event metadata.
        metadata: EventMetadata,
        /// Model identifier.
        model: String,
    },
    /// A provider responded.
    ProviderResponse {
        /// Event metadata.
        metadata: EventMetadata,
        /// Input tokens billed.
        input_tokens: usize,
        /// Output tokens billed.
        output_tokens: usize,
    },
    /// A provider call failed.
    ProviderError {
        /// Event metadata.
        metadata: EventMetadata,
        /// Human-readable error message.
        message: String,
    },
    /// A tool call intent was parsed from a provider response.
    ToolDetected {
        /// Event metadata.
        metadata: EventMetadata,
        /// Tool name.
        name: String,
    },
    /// A tool call has started executing.
    ToolStart {
        /// Event metadata.
        metadata: EventMetadata,
        /// Tool name.
        name: String,
    },
    /// A tool call completed successfully.
    ToolComplete {
        /// Event metadata.
        metadata: EventMetadata,
        /// Tool name.
        name: String,
        /// Wall-clock duration of the call.
        duration_ms: u64,
    },
    /// A tool call returned an error.
    ToolError {
        /// Event metadata.
        metadata: EventMetadata,
        /// Tool name.
        name: String,
        /// Human-readable error message.
        message: String,
    },
    /// A tool call timed out.
    ToolTimeout {
        /// Event metadata.
        metadata: EventMetadata,
        /// Tool name.
        name: String,
    },
    /// A tool call was approved by the permission manager or callback.
    ToolApproved {
        /// Event metadata.
        metadata: EventMetadata,
        /// Tool name.
        name: String,
    },
    /// A tool call was denied.
    ToolDenied {
        /// Event metadata.
        metadata: EventMetadata,
        /// Tool name.
        name: String,
        /// Reason for denial.
        reason: String,
    },
    /// A tool call was served from the idempotency cache.
    ToolCached {
        /// Event metadata.
        metadata: EventMetadata,
        /// Tool name.
        name: String,
    },
    /// A compaction pass started.
    CompactionStart {
        /// Event metadata.
        metadata: EventMetadata,
        /// Strategy name.
        strategy: String,
    },
    /// A compaction pass completed.
    CompactionComplete {
        /// Event metadata.
        metadata: EventMetadata,
        /// Tokens freed.
        freed: usize,
        /// Conversation items removed.
        messages_removed: usize,
    },
    /// A memory entry was stored.
    MemoryStore {
        /// Event metadata.
        metadata: EventMetadata,
        /// Memory key.
        key: String,
    },
    /// A memory entry was deleted.
    MemoryDelete {
        /// Event metadata.
        metadata: EventMetadata,
        /// Memory key.
        key: String,
    },
    /// A memory entry was evicted by a compaction strategy.
    MemoryEvict {
        /// Event metadata.
        metadata: EventMetadata,
        /// Memory key.
        key: String,
        /// Tokens freed by evicting this entry.
        tokens_freed: usize,
    },
}

impl AstridEvent {
    /// A short machine-readable name for this event's variant.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStart { .. } => "run_start",
            Self::RunEnd { .. } => "run_end",
            Self::IterationStart { .. } => "iteration_start",
            Self::IterationComplete { .. } => "iteration_complete",
            Self::ProviderRequest { .. } => "provider_request",
            Self::ProviderResponse { .. } => "provider_response",
            Self::ProviderError { .. } => "provider_error",
            Self::ToolDetected { .. } => "tool_detected",
            Self::ToolStart { .. } => "tool_start",
            Self::ToolComplete { .. } => "tool_complete",
            Self::ToolError { .. } => "tool_error",
            Self::ToolTimeout { .. } => "tool_timeout",
            Self::ToolApproved { .. } => "tool_approved",
            Self::ToolDenied { .. } => "tool_denied",
            Self::ToolCached { .. } => "tool_cached",
            Self::CompactionStart { .. } => "compaction_start",
            Self::CompactionComplete { .. } => "compaction_complete",
            Self::MemoryStore { .. } => "memory_store",
            Self::MemoryDelete { .. } => "memory_delete",
            Self::MemoryEvict { .. } => "memory_evict",
        }
    }

    /// The shared metadata carried by every variant.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            Self::RunStart { metadata }
            | Self::RunEnd { metadata, .. }
            | Self::IterationStart { metadata, .. }
            | Self::IterationComplete { metadata, .. }
            | Self::ProviderRequest { metadata, .. }
            | Self::ProviderResponse { metadata, .. }
            | Self::ProviderError { metadata, .. }
            | Self::ToolDetected { metadata, .. }
            | Self::ToolStart { metadata, .. }
            | Self::ToolComplete { metadata, .. }
            | Self::ToolError { metadata, .. }
            | Self::ToolTimeout { metadata, .. }
            | Self::ToolApproved { metadata, .. }
            | Self::ToolDenied { metadata, .. }
            | Self::ToolCached { metadata, .. }
            | Self::CompactionStart { metadata, .. }
            | Self::CompactionComplete { metadata, .. }
            | Self::MemoryStore { metadata, .. }
            | Self::MemoryDelete { metadata, .. }
            | Self::MemoryEvict { metadata, .. } => metadata,
        }
    }
}

impl fmt::Display for AstridEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_type())
    }
}
