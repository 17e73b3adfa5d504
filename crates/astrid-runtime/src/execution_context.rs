//! Per-run bookkeeping: iteration/tool-call counters, consecutive-error
//! tracking, and wall-clock budget enforcement.

use std::time::{Duration, Instant};

use astrid_storage::ExecutionMetricsSnapshot;

/// Transient, non-persisted accounting for one agentic-loop run.
///
/// Persisted metrics live in [`ExecutionMetricsSnapshot`]; this type adds
/// the in-memory-only fields needed to enforce `run.max_*` limits and the
/// consecutive-error circuit in `run.error_handling`.
#[derive(Debug)]
pub struct ExecutionContext {
    started_at: Instant,
    iteration: u32,
    tool_calls: u32,
    llm_calls: u64,
    llm_tokens_in: u64,
    llm_tokens_out: u64,
    tool_errors: u64,
    compactions: u64,
    consecutive_errors_by_tool: std::collections::HashMap<String, u32>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    /// Start tracking a fresh run.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            iteration: 0,
            tool_calls: 0,
            llm_calls: 0,
            llm_tokens_in: 0,
            llm_tokens_out: 0,
            tool_errors: 0,
            compactions: 0,
            consecutive_errors_by_tool: std::collections::HashMap::new(),
        }
    }

    /// Restore accounting from a persisted snapshot, resetting the
    /// wall-clock start (elapsed time does not survive a restart).
    #[must_use]
    pub fn from_snapshot(snapshot: &ExecutionMetricsSnapshot) -> Self {
        Self {
            started_at: Instant::now(),
            iteration: 0,
            tool_calls: 0,
            llm_calls: snapshot.llm_calls,
            llm_tokens_in: snapshot.llm_tokens_in,
            llm_tokens_out: snapshot.llm_tokens_out,
            tool_errors: snapshot.tool_errors,
            compactions: snapshot.compactions,
            consecutive_errors_by_tool: std::collections::HashMap::new(),
        }
    }

    /// Elapsed wall-clock time since this context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Record the start of a new iteration, returning its 1-indexed number.
    pub fn begin_iteration(&mut self) -> u32 {
        self.iteration += 1;
        self.iteration
    }

    /// Current iteration number (0 before the first iteration starts).
    #[must_use]
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Record a completed LLM call.
    pub fn record_llm_call(&mut self, tokens_in: u64, tokens_out: u64) {
        self.llm_calls += 1;
        self.llm_tokens_in += tokens_in;
        self.llm_tokens_out += tokens_out;
    }

    /// Record a dispatched tool call and update its consecutive-error
    /// streak. Returns the tool's current consecutive-error count.
    pub fn record_tool_call(&mut self, tool_name: &str, succeeded: bool) -> u32 {
        self.tool_calls += 1;
        let entry = self.consecutive_errors_by_tool.entry(tool_name.to_owned()).or_insert(0);
        if succeeded {
            *entry = 0;
        } else {
            self.tool_errors += 1;
            *entry += 1;
        }
        *entry
    }

    /// Record a compaction pass.
    pub fn record_compaction(&mut self) {
        self.compactions += 1;
    }

    /// Total tool calls dispatched so far in this run.
    #[must_use]
    pub fn tool_calls(&self) -> u32 {
        self.tool_calls
    }

    /// Whether `iteration` has reached `max_iterations`.
    #[must_use]
    pub fn iteration_limit_reached(&self, max_iterations: u32) -> bool {
        self.iteration >= max_iterations
    }

    /// Whether `elapsed()` has reached `max_execution_ms`.
    #[must_use]
    pub fn time_limit_reached(&self, max_execution_ms: Option<u64>) -> bool {
        max_execution_ms.is_some_and(|max| self.elapsed().as_millis() as u64 >= max)
    }

    /// Whether `tool_calls` has reached `max_tool_calls`.
    #[must_use]
    pub fn tool_call_limit_reached(&self, max_tool_calls: Option<u32>) -> bool {
        max_tool_calls.is_some_and(|max| self.tool_calls >= max)
    }

    /// Snapshot the persisted portion of this context's metrics.
    #[must_use]
    pub fn to_snapshot(&self) -> ExecutionMetricsSnapshot {
        ExecutionMetricsSnapshot {
            llm_calls: self.llm_calls,
            llm_tokens_in: self.llm_tokens_in,
            llm_tokens_out: self.llm_tokens_out,
            tool_calls: u64::from(self.tool_calls),
            tool_errors: self.tool_errors,
            compactions: self.compactions,
        }
    }
}
