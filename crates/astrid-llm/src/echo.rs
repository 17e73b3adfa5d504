//! `EchoProvider` — a deterministic, in-memory reference adapter.
//!
//! No network access, no API key. Used by the test suite and the demo
//! binary to drive the worked scenarios without depending on a real
//! provider. Responses are derived mechanically from the last user
//! message: text in, same text echoed back, unless the message asks for a
//! tool call in which case a scripted tool call is emitted instead.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;

use crate::error::LlmResult;
use crate::provider::{LlmProvider, StreamBox};
use crate::types::{
    LlmResponse, LlmToolDefinition, Message, MessageContent, StopReason, StreamEvent, ToolCall,
    Usage,
};

/// A scripted action the next [`EchoProvider::complete`]/`stream` call
/// should take, queued by the test or demo harness driving it.
#[derive(Debug, Clone)]
pub enum EchoScript {
    /// Echo the last user message's text back verbatim.
    EchoText,
    /// Emit a tool call with the given name and arguments.
    CallTool {
        /// Tool name to call.
        name: String,
        /// Arguments to pass.
        arguments: serde_json::Value,
    },
    /// Return fixed text regardless of input.
    Fixed(String),
}

/// Deterministic in-memory provider: no network, no API key, same input
/// always produces the same output.
pub struct EchoProvider {
    model: String,
    max_context_length: usize,
    script: Mutex<Vec<EchoScript>>,
}

impl EchoProvider {
    /// Create a provider that echoes the last user message's text.
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: "echo-1".to_string(),
            max_context_length: 200_000,
            script: Mutex::new(Vec::new()),
        }
    }

    /// Queue scripted responses, consumed in order across successive
    /// `complete`/`stream` calls. Once the queue is empty, calls fall back
    /// to [`EchoScript::EchoText`].
    #[must_use]
    pub fn with_script(self, script: Vec<EchoScript>) -> Self {
        *self.script.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = script;
        self
    }

    fn next_action(&self, messages: &[Message]) -> EchoScript {
        let mut queue = self.script.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !queue.is_empty() {
            return queue.remove(0);
        }
        drop(queue);

        let last_text = messages
            .iter()
            .rev()
            .find_map(Message::text)
            .unwrap_or("")
            .to_string();
        EchoScript::Fixed(last_text)
    }

    fn respond(&self, action: EchoScript) -> LlmResponse {
        match action {
            EchoScript::EchoText | EchoScript::Fixed(_) => {
                let text = match action {
                    EchoScript::Fixed(t) => t,
                    _ => String::new(),
                };
                LlmResponse {
                    message: Message::assistant(text),
                    has_tool_calls: false,
                    stop_reason: StopReason::EndTurn,
                    usage: Usage { input_tokens: 1, output_tokens: 1 },
                }
            },
            EchoScript::CallTool { name, arguments } => {
                let call = ToolCall::new(uuid::Uuid::new_v4().to_string(), name)
                    .with_arguments(arguments);
                LlmResponse {
                    message: Message {
                        role: crate::types::MessageRole::Assistant,
                        content: MessageContent::ToolCalls(vec![call]),
                    },
                    has_tool_calls: true,
                    stop_reason: StopReason::ToolUse,
                    usage: Usage { input_tokens: 1, output_tokens: 1 },
                }
            },
        }
    }
}

impl Default for EchoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn stream(
        &self,
        messages: &[Message],
        _tools: &[LlmToolDefinition],
        _system: &str,
    ) -> LlmResult<StreamBox> {
        let action = self.next_action(messages);
        let response = self.respond(action);

        let mut events = Vec::new();
        match &response.message.content {
            MessageContent::Text(text) => {
                events.push(Ok(StreamEvent::TextDelta(text.clone())));
            },
            MessageContent::ToolCalls(calls) => {
                for call in calls {
                    events.push(Ok(StreamEvent::ToolCallStart {
                        id: call.id.clone(),
                        name: call.name.clone(),
                    }));
                    events.push(Ok(StreamEvent::ToolCallDelta {
                        id: call.id.clone(),
                        args_delta: call.arguments.to_string(),
                    }));
                    events.push(Ok(StreamEvent::ToolCallEnd { id: call.id.clone() }));
                }
            },
            MessageContent::ToolResult(_) | MessageContent::MultiPart(_) => {},
        }
        events.push(Ok(StreamEvent::Usage {
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        }));
        events.push(Ok(StreamEvent::Done));

        let boxed: StreamBox = Box::pin(stream::iter(events));
        Ok(boxed)
    }

    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[LlmToolDefinition],
        _system: &str,
    ) -> LlmResult<LlmResponse> {
        let action = self.next_action(messages);
        Ok(self.respond(action))
    }

    fn max_context_length(&self) -> usize {
        self.max_context_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_last_user_text() {
        let provider = EchoProvider::new();
        let messages = vec![Message::user("hello there")];
        let response = provider.complete(&messages, &[], "").await.unwrap();
        assert_eq!(response.message.text(), Some("hello there"));
        assert!(!response.has_tool_calls);
    }

    #[tokio::test]
    async fn scripted_tool_call_is_returned() {
        let provider = EchoProvider::new().with_script(vec![EchoScript::CallTool {
            name: "add".to_string(),
            arguments: serde_json::json!({"a": 1, "b": 2}),
        }]);
        let messages = vec![Message::user("add 1 and 2")];
        let response = provider.complete(&messages, &[], "").await.unwrap();
        assert!(response.has_tool_calls);
        let calls = response.message.tool_calls().unwrap();
        assert_eq!(calls[0].name, "add");
    }

    #[tokio::test]
    async fn stream_emits_text_delta_then_done() {
        use futures::StreamExt;

        let provider = EchoProvider::new();
        let messages = vec![Message::user("hi")];
        let mut stream = provider.stream(&messages, &[], "").await.unwrap();

        let mut saw_done = false;
        while let Some(event) = stream.next().await {
            if matches!(event.unwrap(), StreamEvent::Done) {
                saw_done = true;
            }
        }
        assert!(saw_done);
    }
}
