//! In-process event fan-out for gateway implementations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use super::{EventKinds, EventPredicate, Subscription, SubscriptionId};
use crate::types::Event;

struct Subscriber {
    id: SubscriptionId,
    kinds: EventKinds,
    predicate: EventPredicate,
    sender: mpsc::UnboundedSender<Event>,
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    subscribers: Vec<Subscriber>,
    closed: bool,
}

/// Routes published events to matching subscriptions.
///
/// Closing the hub drops every sender, which every waiting subscription observes as a lost
/// connection. Subscribing to a closed hub yields a subscription that is already closed.
#[derive(Default)]
pub struct EventHub {
    state: Mutex<HubState>,
}

impl EventHub {
    /// Create an open hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a subscription.
    pub fn subscribe(&self, kinds: EventKinds, predicate: EventPredicate) -> Subscription {
        let mut state = self.lock();
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        let (sender, receiver) = mpsc::unbounded_channel();

        if state.closed {
            tracing::debug!(subscription = %id, "subscribe on closed hub");
        } else {
            state.subscribers.push(Subscriber {
                id,
                kinds,
                predicate,
                sender,
            });
        }

        Subscription::new(id, receiver)
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().subscribers.retain(|s| s.id != id);
    }

    /// Deliver an event to every matching subscription.
    ///
    /// Returns how many subscriptions received it. Subscriptions whose receiver has gone away
    /// are pruned. Predicates run after the hub is unlocked, so they may call back into it.
    pub fn publish(&self, event: &Event) -> usize {
        let candidates: Vec<(EventPredicate, mpsc::UnboundedSender<Event>)> = {
            let mut state = self.lock();
            state.subscribers.retain(|s| !s.sender.is_closed());
            state
                .subscribers
                .iter()
                .filter(|s| s.kinds.accepts(event))
                .map(|s| (Arc::clone(&s.predicate), s.sender.clone()))
                .collect()
        };

        candidates
            .into_iter()
            .filter(|(predicate, sender)| predicate(event) && sender.send(event.clone()).is_ok())
            .count()
    }

    /// Simulate or propagate a disconnect: every live subscription ends.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.subscribers.clear();
    }

    /// Accept subscriptions again after [`close`](Self::close).
    pub fn reopen(&self) {
        self.lock().closed = false;
    }

    /// Check if the hub has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("EventHub")
            .field("subscribers", &state.subscribers.len())
            .field("closed", &state.closed)
            .finish()
    }
}
