//! Astrid Events - the audit/telemetry event stream for the agentic loop.
//!
//! This crate provides:
//! - [`AstridEvent`], the typed event stream described by the runtime's
//!   audit log (run/iteration/provider/tool/compaction/memory events)
//! - A broadcast-based [`EventBus`] for async subscribers
//! - A synchronous [`SubscriberRegistry`] for in-process callback-based
//!   fan-out, delivered in registration order with isolated failure
//!
//! # Example
//!
//! ```rust
//! use astrid_core::SessionId;
//! use astrid_events::{AstridEvent, EventBus, EventMetadata};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe();
//!
//! let run_id = SessionId::new();
//! bus.publish(AstridEvent::RunStart {
//!     metadata: EventMetadata::new(run_id, 0),
//! });
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type(), "run_start");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod event;
mod subscriber;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
pub use event::{AstridEvent, EventMetadata};
pub use subscriber::{
    EventFilter, EventSubscriber, FilterSubscriber, SubscriberId, SubscriberRegistry,
};
