//! Astrid Hooks - user-defined extension points for the agentic loop.
//!
//! This crate provides the hook system described for the loop's seven
//! hook points: `before:iteration`, `after:iteration`, `before:tool`,
//! `after:tool`, `approve:tool`, `before:compact`, `after:compact`. Hooks
//! registered for the same event run in priority order and may block the
//! operation or return partial modifications to its inputs.
//!
//! # Hook Handlers
//!
//! Hooks can be implemented using different handlers:
//! - **Command**: execute a shell command, passing context via stdin/env
//! - **Agent**: invoke an LLM-based handler (stubbed until a provider is
//!   wired in by the caller)
//!
//! # Example
//!
//! ```rust,ignore
//! use astrid_hooks::{Hook, HookEvent, HookHandler, HookManager};
//!
//! let mut manager = HookManager::new();
//!
//! let hook = Hook::new(HookEvent::BeforeTool)
//!     .with_handler(HookHandler::Command {
//!         command: "echo".to_string(),
//!         args: vec!["tool called: $ASTRID_HOOK_DATA".to_string()],
//!         env: Default::default(),
//!         working_dir: None,
//!     });
//!
//! manager.register(hook);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod config;
pub mod discovery;
pub mod executor;
pub mod handler;
pub mod hook;
pub mod manager;
pub mod profiles;
pub mod result;

pub use config::HooksConfig;
pub use discovery::discover_hooks;
pub use executor::HookExecutor;
pub use hook::{Hook, HookEvent, HookHandler};
pub use manager::HookManager;
pub use profiles::HookProfile;
pub use result::HookResult;
