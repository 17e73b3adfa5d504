//! Agent hook handler (stubbed).
//!
//! This module defines the interface for LLM-based hook handlers. Wiring it
//! to a real `astrid_llm::LlmProvider` is left to the caller that owns a
//! provider instance; this crate has no provider dependency of its own.

use std::time::Duration;
use tracing::warn;

use super::{HandlerError, HandlerResult};
use crate::hook::HookHandler;
use crate::result::{HookContext, HookExecutionResult};

/// Handler for LLM-based agents (stubbed).
///
/// A real implementation would invoke an `LlmProvider` to process the hook
/// event and parse its response into a `HookResult`. For now it always
/// returns `Skipped`.
#[derive(Debug, Clone, Default)]
pub struct AgentHandler;

impl AgentHandler {
    /// Create a new agent handler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Execute an agent handler (stubbed).
    ///
    /// # Errors
    ///
    /// Returns an error if the handler configuration is invalid.
    #[allow(clippy::unused_async)]
    pub async fn execute(
        &self,
        handler: &HookHandler,
        _context: &HookContext,
        _timeout: Duration,
    ) -> HandlerResult<HookExecutionResult> {
        let HookHandler::Agent {
            prompt_template,
            model,
            max_tokens,
        } = handler
        else {
            return Err(HandlerError::InvalidConfiguration(
                "expected Agent handler".to_string(),
            ));
        };

        warn!(
            prompt_template = %prompt_template,
            model = ?model,
            max_tokens = ?max_tokens,
            "agent handler has no provider wired, skipping"
        );

        Ok(HookExecutionResult::Skipped {
            reason: format!(
                "Agent handlers are not yet implemented (model: {})",
                model.as_deref().unwrap_or("default")
            ),
        })
    }

    /// Check if the agent runtime is available.
    ///
    /// Always returns `false` until a provider is wired in.
    #[must_use]
    pub fn is_available() -> bool {
        false
    }
}

/// Configuration for agent execution, once a provider is wired in.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Default model to use.
    pub default_model: String,
    /// Maximum tokens for responses.
    pub max_tokens: u32,
    /// Temperature for sampling.
    pub temperature: f64,
    /// System prompt prefix.
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            default_model: "claude-3-haiku".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            system_prompt: "You are a hook handler for the agentic loop. \
                Analyze the event and return a JSON response with an 'action' field \
                (continue or block) and appropriate additional fields."
                .to_string(),
        }
    }
}
