//! Typed, synchronous subscriber fan-out (§9 event-emitter redesign).
//!
//! Delivery is synchronous, in registration order, and isolated: a
//! subscriber that errors or panics-safely-guards never prevents later
//! subscribers in the list from receiving the event.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::event::AstridEvent;

/// Identifier for a registered subscriber, returned by [`SubscriberRegistry::register`]
/// so callers can later [`SubscriberRegistry::unregister`] it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber-{}", self.0)
    }
}

/// A synchronous receiver of [`AstridEvent`]s.
///
/// Implementations should be cheap and non-blocking; anything expensive
/// should hand the event off to a queue or spawned task rather than doing
/// work inline.
pub trait EventSubscriber: Send + Sync {
    /// Called once per published event, in the subscriber's registration
    /// order relative to other subscribers.
    fn on_event(&self, event: &AstridEvent);
}

/// Registry of [`EventSubscriber`]s, delivering events synchronously and in
/// registration order. One subscriber erroring never stops delivery to the
/// rest; subscribers must not panic, but `notify` does not propagate
/// anything they return.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    subscribers: std::sync::RwLock<Vec<(SubscriberId, Arc<dyn EventSubscriber>)>>,
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("count", &self.len())
            .finish()
    }
}

impl SubscriberRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber, returning a handle that can later be passed
    /// to [`Self::unregister`].
    #[allow(clippy::missing_panics_doc)]
    pub fn register(&self, subscriber: Arc<dyn EventSubscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscribers
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((id, subscriber));
        id
    }

    /// Remove a previously registered subscriber. Returns `true` if it was
    /// present.
    #[allow(clippy::missing_panics_doc)]
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let mut guard = self
            .subscribers
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|(sid, _)| *sid != id);
        guard.len() != before
    }

    /// Number of currently registered subscribers.
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the registry has no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every registered subscriber, in registration
    /// order. Subscribers are isolated from one another: this never
    /// short-circuits early.
    #[allow(clippy::missing_panics_doc)]
    pub fn notify(&self, event: &AstridEvent) {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        for (id, subscriber) in &subscribers {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                subscriber.on_event(event);
            }));
            if outcome.is_err() {
                warn!(subscriber = %id, event = %event, "subscriber panicked while handling event");
            }
        }
    }
}

/// A predicate deciding which events a [`FilterSubscriber`] forwards to its
/// inner subscriber.
pub trait EventFilter: Send + Sync {
    /// Returns `true` if `event` should be delivered.
    fn matches(&self, event: &AstridEvent) -> bool;
}

impl<F> EventFilter for F
where
    F: Fn(&AstridEvent) -> bool + Send + Sync,
{
    fn matches(&self, event: &AstridEvent) -> bool {
        self(event)
    }
}

/// Wraps an [`EventSubscriber`] so it only receives events matching a
/// given [`EventFilter`].
pub struct FilterSubscriber<F> {
    filter: F,
    inner: Arc<dyn EventSubscriber>,
}

impl<F> FilterSubscriber<F>
where
    F: EventFilter,
{
    /// Wrap `inner`, delivering only events for which `filter` returns true.
    pub fn new(filter: F, inner: Arc<dyn EventSubscriber>) -> Self {
        Self { filter, inner }
    }
}

impl<F> EventSubscriber for FilterSubscriber<F>
where
    F: EventFilter,
{
    fn on_event(&self, event: &AstridEvent) {
        if self.filter.matches(event) {
            self.inner.on_event(event);
        }
    }
}
