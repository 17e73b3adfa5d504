//! A small cloneable cancellation signal.
//!
//! Every clone shares the same flag and notifier, so cancelling any handle
//! cancels all of them. Used in place of `tokio_util::sync::CancellationToken`
//! so the crate does not pull in `tokio-util` for a single bit of state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cooperative cancellation flag, awaitable in a `tokio::select!` arm.
#[derive(Clone)]
pub struct CancelSignal {
    inner: Arc<Inner>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    /// Create a fresh, not-yet-cancelled signal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Mark this signal (and every clone of it) as cancelled, waking any
    /// task currently awaiting [`Self::cancelled`].
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether [`Self::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once this signal is cancelled. Safe to race in
    /// `tokio::select!`: if cancellation already happened, resolves
    /// immediately.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
