//! The agentic loop (§4.1): drives one user turn to completion across
//! however many provider round-trips and tool dispatches it takes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use astrid_approval::PermissionManager;
use astrid_audit::{AuditAction, AuditLog, AuditOutcome};
use astrid_config::{ContextConfig, RunConfig};
use astrid_core::conversation::{ContentBlock, ConversationItem, Role};
use astrid_core::ids::ToolCallId;
use astrid_core::tool_descriptor::ToolDescriptor;
use astrid_events::{AstridEvent, EventBus, EventMetadata};
use astrid_hooks::result::HookContext;
use astrid_hooks::{HookEvent, HookManager, HookResult};
use astrid_llm::{LlmProvider, LlmToolDefinition, Message, ToolCall as LlmToolCall};
use astrid_storage::SessionStore;
use astrid_tools::manager::{ToolCall as ManagerToolCall, ToolCallResult as ManagerToolCallResult, ToolManager};
use astrid_tools::{ToolContext, ToolRegistry};

use crate::cancel::CancelSignal;
use crate::context::ContextManager;
use crate::error::{RuntimeError, RuntimeResult};
use crate::memory::{InContextMemoryPlugin, MemoryPlugin, MemoryStore, Scope, Tier, WorkingMemoryPlugin};
use crate::session::AgentSession;
use crate::subagent::{SubAgentId, SubAgentPool};
use crate::subagent_executor::{SubAgentExecutor, DEFAULT_SUBAGENT_TIMEOUT};

/// Default concurrency/depth limits for a runtime's sub-agent pool, used
/// when no pool is supplied via [`AgentRuntime::with_subagent_pool`].
const DEFAULT_SUBAGENT_CONCURRENCY: usize = 4;
const DEFAULT_SUBAGENT_DEPTH: usize = 3;

/// Run-level and context-level configuration an [`AgentRuntime`] is built
/// with.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Model selection, loop limits, error handling.
    pub run: RunConfig,
    /// Compaction strategy and token estimation.
    pub context: ContextConfig,
    /// Provider call retry/backoff policy.
    pub retry: astrid_config::RetrySection,
}

/// Owns every subsystem the agentic loop coordinates, and drives the loop
/// itself. One runtime instance is shared across every session a process
/// handles; per-run state (tool manager, context manager, tool context) is
/// built fresh for each [`AgentRuntime::run`] call.
pub struct AgentRuntime<P: LlmProvider> {
    provider: Arc<P>,
    tools: Arc<ToolRegistry>,
    permissions: Arc<PermissionManager>,
    hooks: Arc<HookManager>,
    store: Arc<dyn SessionStore>,
    events: Arc<EventBus>,
    audit: Arc<AuditLog>,
    in_context_memory: Arc<InContextMemoryPlugin>,
    working_memory: Arc<WorkingMemoryPlugin>,
    subagent_pool: Arc<SubAgentPool>,
    workspace_root: PathBuf,
    config: RuntimeConfig,
}

impl<P: LlmProvider + 'static> AgentRuntime<P> {
    /// Construct a runtime over the given subsystems. Starts with a
    /// default-sized sub-agent pool and fresh, empty memory plugins;
    /// override either with the `with_*` builders before first use.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        provider: Arc<P>,
        tools: Arc<ToolRegistry>,
        permissions: Arc<PermissionManager>,
        hooks: Arc<HookManager>,
        store: Arc<dyn SessionStore>,
        events: Arc<EventBus>,
        audit: Arc<AuditLog>,
        workspace_root: PathBuf,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            permissions,
            hooks,
            store,
            events,
            audit,
            in_context_memory: Arc::new(InContextMemoryPlugin::new()),
            working_memory: Arc::new(WorkingMemoryPlugin::new()),
            subagent_pool: Arc::new(SubAgentPool::new(DEFAULT_SUBAGENT_CONCURRENCY, DEFAULT_SUBAGENT_DEPTH)),
            workspace_root,
            config,
        }
    }

    /// Override the sub-agent pool (concurrency/depth limits).
    #[must_use]
    pub fn with_subagent_pool(mut self, pool: Arc<SubAgentPool>) -> Self {
        self.subagent_pool = pool;
        self
    }

    /// The underlying session store, for callers checkpointing outside the loop.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// The audit log, for callers recording events around a run (session
    /// start/end) rather than during it.
    #[must_use]
    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// The sub-agent pool backing this runtime's `task` tool dispatches.
    #[must_use]
    pub fn subagent_pool(&self) -> &Arc<SubAgentPool> {
        &self.subagent_pool
    }

    /// The permission manager gating tool execution, for callers adjusting
    /// allow/block lists or tool scopes outside the loop.
    #[must_use]
    pub fn permissions(&self) -> &Arc<PermissionManager> {
        &self.permissions
    }

    fn memory_plugins(&self) -> Vec<Arc<dyn MemoryPlugin>> {
        vec![
            Arc::clone(&self.in_context_memory) as Arc<dyn MemoryPlugin>,
            Arc::clone(&self.working_memory) as Arc<dyn MemoryPlugin>,
        ]
    }

    async fn apply_hook_result(&self, result: HookResult) -> RuntimeResult<()> {
        let HookResult::Block { reason } = result else {
            return Ok(());
        };
        match self.config.run.error_handling.hook_failure_mode {
            astrid_config::HookFailureMode::Fail => Err(RuntimeError::HookBlocked { reason }),
            astrid_config::HookFailureMode::Warn => {
                tracing::warn!(reason = %reason, "hook blocked, continuing per configured failure mode");
                Ok(())
            },
            astrid_config::HookFailureMode::Ignore => Ok(()),
        }
    }

    /// Drive one user turn to completion: appends `user_message` to the
    /// session's conversation, then loops provider calls and tool
    /// dispatches until the model stops requesting tools or a limit is
    /// hit. Returns the final assistant text.
    ///
    /// `current_subagent_id` is `None` for a root session's turn, and
    /// `Some` when this run is itself executing inside a sub-agent (so
    /// nested `task` tool calls report the correct parent in the pool).
    ///
    /// # Errors
    ///
    /// Returns a [`RuntimeError`] if the run is cancelled, a configured
    /// limit is exceeded, a hook blocks under `hook-failure-mode: fail`,
    /// the context cannot be compacted under budget, or an underlying
    /// subsystem fails.
    pub async fn run(
        self: &Arc<Self>,
        session: &mut AgentSession,
        user_message: impl Into<String>,
        cancel: CancelSignal,
        current_subagent_id: Option<SubAgentId>,
    ) -> RuntimeResult<String> {
        session.document.conversation.push(ConversationItem::user_text(user_message));

        let mut context_manager = ContextManager::new(self.provider.max_context_length() as u64, self.config.context.clone());
        let tool_manager = ToolManager::new(Arc::clone(&self.tools), Arc::clone(&self.permissions), session.id)
            .with_events(Arc::clone(&self.events));

        let tool_ctx = ToolContext::new(self.workspace_root.clone());
        let subagent_executor = Arc::new(SubAgentExecutor::new(
            Arc::clone(self),
            Arc::clone(&self.subagent_pool),
            session.id,
            current_subagent_id,
            DEFAULT_SUBAGENT_TIMEOUT,
        ));
        tool_ctx.set_subagent_spawner(Some(subagent_executor)).await;

        loop {
            if cancel.is_cancelled() {
                return Err(RuntimeError::Cancelled);
            }
            if session.execution.iteration_limit_reached(self.config.run.max_iterations) {
                return Err(RuntimeError::IterationLimitExceeded { max: self.config.run.max_iterations });
            }
            if session.execution.time_limit_reached(self.config.run.max_execution_ms) {
                return Err(RuntimeError::ExecutionTimeExceeded {
                    max_ms: self.config.run.max_execution_ms.unwrap_or_default(),
                });
            }

            let iteration = session.execution.begin_iteration();
            self.events.publish(AstridEvent::IterationStart {
                metadata: self.metadata(session),
                iteration,
            });

            let (before, _) = self
                .hooks
                .trigger(HookContext::new(HookEvent::BeforeIteration).with_session(session.id.0))
                .await;
            self.apply_hook_result(before).await?;

            let plugins = self.memory_plugins();
            let assembled = context_manager.assemble(
                &session.system_prompt,
                vec![self.in_context_memory.instructions(), self.working_memory.instructions()],
                session.document.conversation.clone(),
                &plugins,
                Some(&self.in_context_memory),
                Some(&self.working_memory),
            )?;

            if context_manager.stats().compacted {
                session.execution.record_compaction();
                let before_len = session.document.conversation.len();
                let after_len = assembled.conversation.len();
                session.document.conversation = assembled.conversation.clone();
                self.events.publish(AstridEvent::CompactionComplete {
                    metadata: self.metadata(session),
                    freed: 0,
                    messages_removed: before_len.saturating_sub(after_len),
                });
                self.audit.append(
                    session.id,
                    AuditAction::ContextCompacted {
                        evicted_count: before_len.saturating_sub(after_len),
                        tokens_freed: 0,
                    },
                    AuditOutcome::success(),
                )?;
                let (after_hook, _) = self
                    .hooks
                    .trigger(HookContext::new(HookEvent::AfterCompact).with_session(session.id.0))
                    .await;
                self.apply_hook_result(after_hook).await?;
            }

            let system = render_system(&assembled.system_instructions, &assembled.plugin_instructions, &assembled.plugin_content);
            let messages = conversation_to_messages(&assembled.conversation);
            let tool_defs = self.tool_definitions();

            self.events.publish(AstridEvent::ProviderRequest {
                metadata: self.metadata(session),
                model: self.provider.model().to_owned(),
            });
            self.audit.append(
                session.id,
                AuditAction::ProviderRequest { model: self.provider.model().to_owned() },
                AuditOutcome::success(),
            )?;

            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(RuntimeError::Cancelled),
                result = self.call_provider(&messages, &tool_defs, &system) => result?,
            };

            session.execution.record_llm_call(response.usage.input_tokens as u64, response.usage.output_tokens as u64);
            self.events.publish(AstridEvent::ProviderResponse {
                metadata: self.metadata(session),
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
            });

            append_assistant_response(&mut session.document.conversation, &response.message);

            if !response.has_tool_calls {
                let final_text = extract_text(&response.message).unwrap_or_default();
                let (after, _) = self
                    .hooks
                    .trigger(HookContext::new(HookEvent::AfterIteration).with_session(session.id.0))
                    .await;
                self.apply_hook_result(after).await?;
                self.events.publish(AstridEvent::IterationComplete {
                    metadata: self.metadata(session),
                    iteration,
                    tool_calls: 0,
                });
                session.checkpoint();
                self.store.save(session.id, &session.document).await?;
                return Ok(final_text);
            }

            let calls = response.message.tool_calls().unwrap_or(&[]).to_vec();

            let results = self
                .dispatch_tool_calls(session, &calls, &tool_manager, &tool_ctx, &cancel)
                .await?;

            for result in &results {
                let call = calls.iter().find(|c| c.id == result.call_id);
                let tool_name = call.map_or_else(|| "unknown".to_owned(), |c| c.name.clone());
                let succeeded = !result.is_error;
                let streak = session.execution.record_tool_call(&tool_name, succeeded);
                self.audit.append(
                    session.id,
                    AuditAction::ToolCall { tool: tool_name.clone(), call_id: result.call_id.clone() },
                    if succeeded { AuditOutcome::success() } else { AuditOutcome::failure(result.output.clone()) },
                )?;

                session.document.conversation.push(ConversationItem::tool_result(
                    ToolCallId::from(result.call_id.clone()),
                    result.output.clone(),
                    result.is_error,
                ));

                if !succeeded {
                    if streak >= self.config.run.error_handling.max_consecutive_errors {
                        return Err(RuntimeError::TooManyConsecutiveErrors { tool_name, count: streak });
                    }
                    if self.config.run.error_handling.tool_failure_mode == astrid_config::ToolFailureMode::Fail {
                        return Err(RuntimeError::ToolFailed { tool_name, reason: result.output.clone() });
                    }
                }
            }

            if session.execution.tool_call_limit_reached(self.config.run.max_tool_calls) {
                return Err(RuntimeError::ToolCallLimitExceeded { max: self.config.run.max_tool_calls.unwrap_or_default() });
            }

            let consolidation = context_manager.consolidate(
                &mut session.document.conversation,
                Some(&self.in_context_memory),
                Some(&self.working_memory),
            );
            if consolidation.performed {
                tracing::debug!(actions = ?consolidation.actions, "post-iteration consolidation performed");
            }

            let (after, _) = self
                .hooks
                .trigger(HookContext::new(HookEvent::AfterIteration).with_session(session.id.0))
                .await;
            self.apply_hook_result(after).await?;
            self.events.publish(AstridEvent::IterationComplete {
                metadata: self.metadata(session),
                iteration,
                tool_calls: results.len(),
            });

            session.checkpoint();
            self.store.save(session.id, &session.document).await?;
        }
    }

    async fn call_provider(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> RuntimeResult<astrid_llm::LlmResponse> {
        let mut attempt = 0u32;
        let mut delay_ms = self.config.retry.initial_delay_ms;
        loop {
            attempt += 1;
            match self.provider.complete(messages, tools, system).await {
                Ok(response) => return Ok(response),
                Err(error) if attempt < self.config.retry.llm_max_attempts => {
                    tracing::warn!(attempt, error = %error, "provider call failed, retrying");
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms = delay_ms.saturating_mul(2).min(self.config.retry.max_delay_ms);
                },
                Err(error) => return Err(RuntimeError::LlmError(error)),
            }
        }
    }

    fn tool_definitions(&self) -> Vec<LlmToolDefinition> {
        let mut defs = self.tools.all_definitions();
        for plugin in self.memory_plugins() {
            for descriptor in plugin.tool_descriptors() {
                defs.push(descriptor_to_llm_def(&descriptor));
            }
        }
        defs
    }

    fn metadata(&self, session: &AgentSession) -> EventMetadata {
        EventMetadata::new(session.id, u64::from(session.execution.iteration()))
    }

    async fn dispatch_tool_calls(
        &self,
        session: &AgentSession,
        calls: &[LlmToolCall],
        tool_manager: &ToolManager,
        tool_ctx: &ToolContext,
        cancel: &CancelSignal,
    ) -> RuntimeResult<Vec<ManagerToolCallResult>> {
        let registry_calls: Vec<ManagerToolCall> = calls
            .iter()
            .filter(|c| !is_plugin_call(&c.name))
            .cloned()
            .map(|c| ManagerToolCall { name: c.name, call_id: c.id, arguments: c.arguments })
            .collect();

        let registry_results = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RuntimeError::Cancelled),
            results = tool_manager.execute_batch(registry_calls, tool_ctx) => results,
        };

        let mut ordered = Vec::with_capacity(calls.len());
        let mut registry_iter = registry_results.into_iter();
        for call in calls {
            if is_plugin_call(&call.name) {
                ordered.push(self.dispatch_plugin_call(session, call.clone()));
            } else {
                ordered.push(registry_iter.next().expect("one registry result per registry call"));
            }
        }
        Ok(ordered)
    }

    fn dispatch_plugin_call(&self, session: &AgentSession, call: LlmToolCall) -> ManagerToolCallResult {
        let start = std::time::Instant::now();
        let Some((plugin_name, op)) = call.name.split_once('.') else {
            return plugin_err(call.id, start, "malformed plugin tool name".to_owned());
        };
        let store: &MemoryStore = match plugin_name {
            "in_context_memory" => self.in_context_memory.store(),
            "working_memory" => self.working_memory.store(),
            other => return plugin_err(call.id, start, format!("unknown memory plugin: {other}")),
        };

        let result = match op {
            "store" => plugin_store(store, &call.arguments).map(|output| {
                self.events.publish(AstridEvent::MemoryStore {
                    metadata: self.metadata(session),
                    key: call.arguments.get("key").and_then(|v| v.as_str()).unwrap_or_default().to_owned(),
                });
                output
            }),
            "retrieve" => plugin_retrieve(store, &call.arguments),
            "retrieve-batch" => plugin_retrieve_batch(store, &call.arguments),
            "list" => plugin_list(store, &call.arguments),
            "delete" => plugin_delete(store, &call.arguments).map(|output| {
                self.events.publish(AstridEvent::MemoryDelete {
                    metadata: self.metadata(session),
                    key: call.arguments.get("key").and_then(|v| v.as_str()).unwrap_or_default().to_owned(),
                });
                output
            }),
            "cleanup-raw" => Ok(store.cleanup_raw().to_string()),
            other => Err(format!("unknown memory operation: {other}")),
        };

        match result {
            Ok(output) => ManagerToolCallResult {
                call_id: call.id,
                output,
                is_error: false,
                duration_ms: elapsed_ms(start),
                cached: false,
            },
            Err(message) => plugin_err(call.id, start, message),
        }
    }
}

fn elapsed_ms(start: std::time::Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn plugin_err(call_id: String, start: std::time::Instant, message: String) -> ManagerToolCallResult {
    ManagerToolCallResult { call_id, output: message, is_error: true, duration_ms: elapsed_ms(start), cached: false }
}

fn is_plugin_call(name: &str) -> bool {
    name.starts_with("in_context_memory.") || name.starts_with("working_memory.")
}

fn plugin_store(store: &MemoryStore, args: &serde_json::Value) -> Result<String, String> {
    let key = args.get("key").and_then(|v| v.as_str()).ok_or("missing `key`")?;
    let value = args.get("value").and_then(|v| v.as_str()).ok_or("missing `value`")?;
    let scope = match args.get("scope").and_then(|v| v.as_str()) {
        Some("plan") => Scope::Plan,
        Some("persistent") => Scope::Persistent,
        _ => Scope::Session,
    };
    let priority = args.get("priority").and_then(serde_json::Value::as_u64).unwrap_or(100) as u32;
    let pinned = args.get("pinned").and_then(serde_json::Value::as_bool).unwrap_or(false);
    let needed_for_tasks = args
        .get("neededForTasks")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
        .unwrap_or_default();
    let description = args.get("description").and_then(|v| v.as_str()).map(str::to_owned);
    store.store(key, value, scope, priority, pinned, needed_for_tasks, description);
    Ok(format!("stored {key}"))
}

fn plugin_retrieve(store: &MemoryStore, args: &serde_json::Value) -> Result<String, String> {
    let key = args.get("key").and_then(|v| v.as_str()).ok_or("missing `key`")?;
    match store.retrieve(key) {
        Some(entry) => Ok(entry.value),
        None => Err(format!("no entry for key: {key}")),
    }
}

fn plugin_retrieve_batch(store: &MemoryStore, args: &serde_json::Value) -> Result<String, String> {
    let keys: Vec<String> = args
        .get("keys")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
        .unwrap_or_default();
    let glob = args.get("glob").and_then(|v| v.as_str());
    let tier = args.get("tier").and_then(|v| v.as_str()).and_then(parse_tier);
    let entries = store.retrieve_batch(&keys, glob, tier);
    serde_json::to_string(&entries.into_iter().map(|e| (e.key, e.value)).collect::<Vec<_>>())
        .map_err(|e| e.to_string())
}

fn plugin_list(store: &MemoryStore, args: &serde_json::Value) -> Result<String, String> {
    let tier = args.get("tier").and_then(|v| v.as_str()).and_then(parse_tier);
    Ok(store.list(tier).join(", "))
}

fn plugin_delete(store: &MemoryStore, args: &serde_json::Value) -> Result<String, String> {
    let key = args.get("key").and_then(|v| v.as_str()).ok_or("missing `key`")?;
    Ok(store.delete(key).to_string())
}

fn parse_tier(raw: &str) -> Option<Tier> {
    match raw {
        "raw" => Some(Tier::Raw),
        "summary" => Some(Tier::Summary),
        "findings" => Some(Tier::Findings),
        _ => None,
    }
}

fn descriptor_to_llm_def(descriptor: &ToolDescriptor) -> LlmToolDefinition {
    LlmToolDefinition::new(descriptor.name.clone())
        .with_description(descriptor.description.clone())
        .with_schema(descriptor.parameters_schema.clone())
}

fn render_system(instructions: &str, plugin_instructions: &[String], plugin_content: &[(String, String)]) -> String {
    let mut rendered = instructions.to_owned();
    for preamble in plugin_instructions {
        rendered.push_str("\n\n");
        rendered.push_str(preamble);
    }
    for (name, content) in plugin_content {
        rendered.push_str(&format!("\n\n## {name}\n{content}"));
    }
    rendered
}

fn conversation_to_messages(items: &[ConversationItem]) -> Vec<Message> {
    let mut out = Vec::new();
    for item in items {
        match item {
            ConversationItem::Message { role, content } => {
                let tool_uses: Vec<LlmToolCall> = content
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::ToolUse { id, name, raw_arguments, .. } => Some(
                            LlmToolCall::new(id.to_string(), name.clone())
                                .with_arguments(serde_json::from_str(raw_arguments).unwrap_or(serde_json::Value::Null)),
                        ),
                        _ => None,
                    })
                    .collect();
                if !tool_uses.is_empty() {
                    out.push(Message::assistant_with_tools(tool_uses));
                }
                for block in content {
                    match block {
                        ContentBlock::InputText { text } => out.push(match role {
                            Role::System | Role::Developer => Message::system(text.clone()),
                            Role::User | Role::Assistant => Message::user(text.clone()),
                        }),
                        ContentBlock::OutputText { text } => out.push(Message::assistant(text.clone())),
                        ContentBlock::ToolResult { tool_use_id, content, is_error, .. } => {
                            out.push(Message::tool_result(if *is_error {
                                astrid_llm::ToolCallResult::error(tool_use_id.to_string(), content.clone())
                            } else {
                                astrid_llm::ToolCallResult::success(tool_use_id.to_string(), content.clone())
                            }));
                        },
                        ContentBlock::ToolUse { .. } | ContentBlock::InputImage { .. } | ContentBlock::Thinking { .. } => {},
                    }
                }
            },
            ConversationItem::Reasoning { text, .. } => {
                if let Some(text) = text {
                    out.push(Message::assistant(text.clone()));
                }
            },
            ConversationItem::CompactionMarker { summary, .. } => {
                out.push(Message::system(format!("[earlier context compacted: {summary}]")));
            },
        }
    }
    out
}

fn append_assistant_response(conversation: &mut Vec<ConversationItem>, message: &Message) {
    match &message.content {
        astrid_llm::MessageContent::Text(text) => {
            conversation.push(ConversationItem::assistant_text(text.clone()));
        },
        astrid_llm::MessageContent::ToolCalls(calls) => {
            let content = calls
                .iter()
                .map(|c| ContentBlock::ToolUse {
                    id: ToolCallId::from(c.id.clone()),
                    name: c.name.clone(),
                    raw_arguments: c.arguments.to_string(),
                    parsed_arguments: Some(c.arguments.clone()),
                })
                .collect();
            conversation.push(ConversationItem::Message { role: Role::Assistant, content });
        },
        astrid_llm::MessageContent::ToolResult(_) | astrid_llm::MessageContent::MultiPart(_) => {},
    }
}

fn extract_text(message: &Message) -> Option<String> {
    message.text().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use astrid_core::ids::ToolCallId as CoreToolCallId;

    #[test]
    fn conversation_to_messages_pairs_tool_use_and_result() {
        let id = CoreToolCallId::new();
        let items = vec![
            ConversationItem::user_text("read the file"),
            ConversationItem::Message {
                role: Role::Assistant,
                content: vec![ContentBlock::ToolUse {
                    id: id.clone(),
                    name: "read_file".to_owned(),
                    raw_arguments: "{\"path\":\"a.txt\"}".to_owned(),
                    parsed_arguments: None,
                }],
            },
            ConversationItem::tool_result(id, "contents", false),
        ];
        let messages = conversation_to_messages(&items);
        assert_eq!(messages.len(), 3);
        assert!(messages[1].tool_calls().is_some());
    }

    #[test]
    fn render_system_concatenates_plugin_sections() {
        let rendered = render_system(
            "be helpful",
            &["use memory wisely".to_owned()],
            &[("in_context_memory".to_owned(), "k: v".to_owned())],
        );
        assert!(rendered.contains("be helpful"));
        assert!(rendered.contains("use memory wisely"));
        assert!(rendered.contains("## in_context_memory"));
    }

    #[test]
    fn is_plugin_call_recognizes_both_memory_plugins() {
        assert!(is_plugin_call("in_context_memory.store"));
        assert!(is_plugin_call("working_memory.retrieve"));
        assert!(!is_plugin_call("bash"));
    }

    #[test]
    fn plugin_store_then_retrieve_round_trips() {
        let store = MemoryStore::new();
        plugin_store(&store, &serde_json::json!({"key": "findings.x", "value": "42"})).unwrap();
        let retrieved = plugin_retrieve(&store, &serde_json::json!({"key": "findings.x"})).unwrap();
        assert_eq!(retrieved, "42");
    }
}
