#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! LLM provider abstraction with streaming support for the agentic loop.
//!
//! Ships the [`LlmProvider`] trait and message/tool data model unchanged
//! from the shape this port has always had, plus one reference adapter,
//! [`EchoProvider`] — a deterministic, no-network implementation used by
//! the test suite and the demo binary. Concrete provider wire formats
//! (Claude, OpenAI-compatible, ...) are out of scope here.

pub mod prelude;

mod echo;
mod error;
mod provider;
mod types;

pub use echo::{EchoProvider, EchoScript};
pub use error::{ErrorKind, LlmError, LlmResult};
pub use provider::{LlmProvider, ProviderConfig, StreamBox};
pub use types::{
    ContentPart, LlmResponse, LlmToolDefinition, Message, MessageContent, MessageRole, StopReason,
    StreamEvent, ToolCall, ToolCallResult, Usage,
};
