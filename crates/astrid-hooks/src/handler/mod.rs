//! Hook handler implementations, dispatched by [`crate::executor::HookExecutor`].

pub mod agent;
pub mod command;

pub use agent::AgentHandler;
pub use command::CommandHandler;

use thiserror::Error;

use crate::result::HookResult;

/// Errors a handler can report while executing a hook.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler was invoked with a `HookHandler` variant it doesn't
    /// implement.
    #[error("invalid handler configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type returned by handler `execute` methods.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Parse a hook's stdout as a [`HookResult`].
///
/// Accepts either a JSON-encoded `HookResult` or the bare words `continue`
/// / `block: <reason>`, matching what a shell-script handler can easily
/// produce on stdout.
///
/// # Errors
///
/// Returns an error if the output is neither valid JSON nor one of the
/// recognized bare forms.
pub fn parse_hook_result(stdout: &str) -> Result<HookResult, String> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("continue") {
        return Ok(HookResult::Continue);
    }
    if let Some(reason) = trimmed.strip_prefix("block:") {
        return Ok(HookResult::block(reason.trim()));
    }
    serde_json::from_str::<HookResult>(trimmed).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_continue() {
        assert!(matches!(
            parse_hook_result("continue"),
            Ok(HookResult::Continue)
        ));
        assert!(matches!(parse_hook_result(""), Ok(HookResult::Continue)));
    }

    #[test]
    fn parses_bare_block() {
        let result = parse_hook_result("block: dangerous tool").unwrap();
        assert!(result.is_blocking());
    }

    #[test]
    fn parses_json_result() {
        let result = parse_hook_result(r#"{"action":"block","reason":"nope"}"#).unwrap();
        assert!(result.is_blocking());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_hook_result("{not json").is_err());
    }
}
