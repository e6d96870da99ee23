//! Run event emitter.
//!
//! Subscribers register a callback with a filter; `emit` stamps the event
//! with the current time and delivers it synchronously to every matching
//! subscriber in registration order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::events::{Event, EventFilter, RunEvent};

type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

struct Subscriber {
    id: u64,
    filter: EventFilter,
    callback: Callback,
}

/// Handle returned by [`Emitter::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle(u64);

/// Dispatches run events to registered subscribers.
#[derive(Default)]
pub struct Emitter {
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl Emitter {
    /// Create an emitter with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for events matching `filter`.
    pub fn on<F>(&self, filter: EventFilter, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.write().push(Subscriber {
            id,
            filter,
            callback: Arc::new(callback),
        });
        SubscriptionHandle(id)
    }

    /// Remove a subscription.
    ///
    /// Unknown handles are ignored.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.subscribers.write().retain(|s| s.id != handle.0);
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Stamp and deliver an event to all matching subscribers.
    pub fn emit(&self, payload: RunEvent) {
        debug!(kind = ?payload.kind(), "emitting run event");
        let event = Event {
            at: Utc::now(),
            payload,
        };

        // Clone the matching callbacks out so subscriber callbacks may
        // themselves subscribe or unsubscribe without deadlocking.
        let callbacks: Vec<Callback> = self
            .subscribers
            .read()
            .iter()
            .filter(|s| s.filter.matches(&event.payload))
            .map(|s| s.callback.clone())
            .collect();

        for callback in callbacks {
            callback(&event);
        }
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
