//! Sub-agent executor — implements `SubAgentSpawner` using the runtime's agentic loop.

use std::sync::Arc;
use std::time::Duration;

use astrid_audit::{AuditAction, AuditOutcome};
use astrid_core::conversation::{ConversationItem, Role};
use astrid_core::ids::SessionId;
use astrid_llm::LlmProvider;
use astrid_tools::{SubAgentRequest, SubAgentResult, SubAgentSpawner};
use tracing::{debug, info, warn};

use crate::cancel::CancelSignal;
use crate::session::AgentSession;
use crate::subagent::{SubAgentId, SubAgentPool};
use crate::AgentRuntime;

/// Default sub-agent timeout (5 minutes).
pub const DEFAULT_SUBAGENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Spawns sub-agents through the runtime's agentic loop.
///
/// Created per-turn and injected into `ToolContext` as `Arc<dyn SubAgentSpawner>`.
pub struct SubAgentExecutor<P: LlmProvider> {
    runtime: Arc<AgentRuntime<P>>,
    pool: Arc<SubAgentPool>,
    parent_session_id: SessionId,
    parent_subagent_id: Option<SubAgentId>,
    default_timeout: Duration,
}

impl<P: LlmProvider> SubAgentExecutor<P> {
    /// Create a new sub-agent executor for one run of `parent_session_id`.
    #[must_use]
    pub fn new(
        runtime: Arc<AgentRuntime<P>>,
        pool: Arc<SubAgentPool>,
        parent_session_id: SessionId,
        parent_subagent_id: Option<SubAgentId>,
        default_timeout: Duration,
    ) -> Self {
        Self { runtime, pool, parent_session_id, parent_subagent_id, default_timeout }
    }
}

#[async_trait::async_trait]
impl<P: LlmProvider + 'static> SubAgentSpawner for SubAgentExecutor<P> {
    async fn spawn(&self, request: SubAgentRequest) -> Result<SubAgentResult, String> {
        let start = std::time::Instant::now();
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let handle = self
            .pool
            .spawn(request.description.clone(), self.parent_subagent_id.clone())
            .await
            .map_err(|e| e.to_string())?;
        let handle_id = handle.id.clone();

        info!(subagent_id = %handle_id, depth = handle.depth, description = %request.description, "sub-agent spawned");
        handle.mark_running().await;

        let session_id = SessionId::new();
        let safe_description = if request.description.len() > 200 {
            format!("{}...", &request.description[..200])
        } else {
            request.description.clone()
        };
        let system_prompt = format!(
            "You are a focused sub-agent. Your task:\n\n{safe_description}\n\n\
             Complete this task and provide a clear, concise result. \
             Do not ask for clarification, work with what you have. \
             When done, provide your final answer as a clear summary.",
        );
        let mut session = AgentSession::child(system_prompt);
        session.id = session_id;

        if let Err(e) = self.runtime.audit().append(
            self.parent_session_id,
            AuditAction::SubAgentSpawned {
                parent_session_id: self.parent_session_id.0.to_string(),
                child_session_id: session_id.0.to_string(),
                description: request.description.clone(),
            },
            AuditOutcome::success(),
        ) {
            warn!(error = %e, "failed to audit sub-agent spawn linkage");
        }

        if let Err(e) = self.runtime.audit().append(
            session_id,
            AuditAction::SessionStarted { frontend: "sub-agent".to_owned() },
            AuditOutcome::success(),
        ) {
            warn!(error = %e, "failed to audit sub-agent session start");
        }

        let cancel = self.pool.cancellation_token();
        let run_result = tokio::time::timeout(
            timeout,
            self.runtime.run(&mut session, request.prompt.clone(), cancel, Some(handle_id.clone())),
        )
        .await;

        let tool_calls = session.execution.tool_calls() as usize;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let result = match run_result {
            Ok(Ok(output)) => {
                debug!(subagent_id = %handle_id, duration_ms, tool_calls, output_len = output.len(), "sub-agent completed");
                handle.complete(output.clone()).await;
                SubAgentResult { success: true, output, duration_ms, tool_calls, error: None }
            },
            Ok(Err(crate::error::RuntimeError::Cancelled)) => {
                let partial = extract_last_assistant_text(&session.document.conversation);
                warn!(subagent_id = %handle_id, duration_ms, "sub-agent cancelled");
                handle.cancel().await;
                SubAgentResult { success: false, output: partial, duration_ms, tool_calls, error: Some("sub-agent cancelled".to_owned()) }
            },
            Ok(Err(e)) => {
                let error_msg = e.to_string();
                let partial = extract_last_assistant_text(&session.document.conversation);
                warn!(subagent_id = %handle_id, error = %error_msg, duration_ms, "sub-agent failed");
                handle.fail(error_msg.clone()).await;
                SubAgentResult { success: false, output: partial, duration_ms, tool_calls, error: Some(error_msg) }
            },
            Err(_elapsed) => {
                let partial = extract_last_assistant_text(&session.document.conversation);
                warn!(subagent_id = %handle_id, timeout_secs = timeout.as_secs(), duration_ms, "sub-agent timed out");
                handle.timeout().await;
                SubAgentResult {
                    success: false,
                    output: partial,
                    duration_ms,
                    tool_calls,
                    error: Some(format!("sub-agent timed out after {} seconds", timeout.as_secs())),
                }
            },
        };

        self.pool.release(&handle_id).await;

        let reason = if result.success { "completed".to_owned() } else { result.error.clone().unwrap_or_else(|| "failed".to_owned()) };
        if let Err(e) = self.runtime.audit().append(
            session_id,
            AuditAction::SessionEnded { reason, duration_secs: duration_ms / 1000 },
            AuditOutcome::success(),
        ) {
            warn!(error = %e, "failed to audit sub-agent session end");
        }

        Ok(result)
    }
}

fn extract_last_assistant_text(conversation: &[ConversationItem]) -> String {
    conversation
        .iter()
        .rev()
        .find_map(|item| match item {
            ConversationItem::Message { role: Role::Assistant, content } => {
                content.iter().find_map(|block| match block {
                    astrid_core::conversation::ContentBlock::OutputText { text } => Some(text.clone()),
                    _ => None,
                })
            },
            _ => None,
        })
        .unwrap_or_else(|| "(sub-agent produced no text output)".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use astrid_core::conversation::ContentBlock;

    #[test]
    fn extracts_the_last_assistant_output_text() {
        let conversation = vec![
            ConversationItem::user_text("hello"),
            ConversationItem::assistant_text("first response"),
            ConversationItem::user_text("another question"),
            ConversationItem::assistant_text("final answer"),
        ];
        assert_eq!(extract_last_assistant_text(&conversation), "final answer");
    }

    #[test]
    fn falls_back_when_no_assistant_message_present() {
        let conversation = vec![ConversationItem::user_text("hello")];
        assert_eq!(extract_last_assistant_text(&conversation), "(sub-agent produced no text output)");
    }

    #[test]
    fn falls_back_on_an_empty_conversation() {
        let conversation: Vec<ConversationItem> = vec![];
        assert_eq!(extract_last_assistant_text(&conversation), "(sub-agent produced no text output)");
    }

    #[test]
    fn ignores_tool_use_blocks_and_finds_preceding_text() {
        let conversation = vec![ConversationItem::Message {
            role: Role::Assistant,
            content: vec![
                ContentBlock::OutputText { text: "thinking out loud".to_owned() },
                ContentBlock::ToolUse {
                    id: astrid_core::ids::ToolCallId::new(),
                    name: "bash".to_owned(),
                    raw_arguments: "{}".to_owned(),
                    parsed_arguments: None,
                },
            ],
        }];
        assert_eq!(extract_last_assistant_text(&conversation), "thinking out loud");
    }
}
