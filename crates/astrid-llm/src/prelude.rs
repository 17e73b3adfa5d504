//! Prelude module - commonly used types for convenient import.
//!
//! Use `use astrid_llm::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust,no_run
//! use astrid_llm::prelude::*;
//!
//! # async fn example() -> LlmResult<()> {
//! let provider = EchoProvider::new();
//! let response = provider.complete_simple("What is 2+2?").await?;
//! println!("Response: {}", response);
//! # Ok(())
//! # }
//! ```

// Errors
pub use crate::{ErrorKind, LlmError, LlmResult};

// Provider trait and config
pub use crate::{LlmProvider, ProviderConfig, StreamBox};

// Reference adapter
pub use crate::{EchoProvider, EchoScript};

// Message types
pub use crate::{ContentPart, Message, MessageContent, MessageRole};

// Response types
pub use crate::{LlmResponse, StopReason, StreamEvent, Usage};

// Tool types
pub use crate::{LlmToolDefinition, ToolCall, ToolCallResult};
