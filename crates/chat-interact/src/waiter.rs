//! Waiting for gateway events.
//!
//! [`EventWaiter::wait_for`] is the one-shot form: subscribe, wait for the first matching event
//! or the timeout, unsubscribe. [`EventWaiter::listen`] keeps a single subscription open across
//! many waits so nothing delivered between two waits is lost.
//!
//! Both forms unsubscribe exactly once on every exit path, including when the waiting future is
//! dropped before it completes.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{InteractError, Result};
use crate::gateway::{EventKinds, Gateway, Subscription, SubscriptionId};
use crate::types::Event;
use crate::util::timeout::Deadline;

/// Outcome of a wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitResult {
    /// A matching event arrived.
    Matched(Event),
    /// The deadline passed first.
    Timeout,
}

impl WaitResult {
    /// Check if the wait timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Get the matched event, if any.
    #[must_use]
    pub fn into_event(self) -> Option<Event> {
        match self {
            Self::Matched(event) => Some(event),
            Self::Timeout => None,
        }
    }
}

/// Suspends until the gateway delivers a matching event.
#[derive(Debug)]
pub struct EventWaiter<'g, G> {
    gateway: &'g G,
}

impl<'g, G: Gateway> EventWaiter<'g, G> {
    /// Create a waiter over a gateway.
    #[must_use]
    pub const fn new(gateway: &'g G) -> Self {
        Self { gateway }
    }

    /// Wait for one event of `kinds` satisfying `predicate`.
    ///
    /// `timeout` of `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::ConnectionLost`] if the gateway closes the event stream first.
    pub async fn wait_for<P>(
        &self,
        kinds: EventKinds,
        predicate: P,
        timeout: Option<Duration>,
    ) -> Result<WaitResult>
    where
        P: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        let mut listener = self.listen(kinds, predicate);
        listener.next(Deadline::after(timeout)).await
    }

    /// Open a long-lived subscription.
    pub fn listen<P>(&self, kinds: EventKinds, predicate: P) -> Listener<'g, G>
    where
        P: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        let subscription = self.gateway.subscribe(kinds, Arc::new(predicate));
        tracing::trace!(subscription = %subscription.id(), ?kinds, "subscribed");
        Listener {
            gateway: self.gateway,
            subscription,
        }
    }
}

/// A subscription that yields matching events one wait at a time.
///
/// Events that arrive while the owner is busy are queued in delivery order. Dropping the
/// listener unsubscribes.
#[derive(Debug)]
pub struct Listener<'g, G: Gateway> {
    gateway: &'g G,
    subscription: Subscription,
}

impl<G: Gateway> Listener<'_, G> {
    /// Get the underlying subscription id.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.subscription.id()
    }

    /// Wait for the next event or until `deadline`.
    ///
    /// An event that is already queued wins over an expired deadline.
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::ConnectionLost`] if the gateway closes the event stream.
    pub async fn next(&mut self, deadline: Deadline) -> Result<WaitResult> {
        tracing::trace!(
            subscription = %self.subscription.id(),
            remaining = ?deadline.remaining(),
            "waiting for event"
        );
        tokio::select! {
            biased;
            event = self.subscription.recv() => match event {
                Some(event) => Ok(WaitResult::Matched(event)),
                None => Err(InteractError::ConnectionLost),
            },
            () = deadline.sleep() => Ok(WaitResult::Timeout),
        }
    }
}

impl<G: Gateway> Drop for Listener<'_, G> {
    fn drop(&mut self) {
        tracing::trace!(subscription = %self.subscription.id(), "unsubscribed");
        self.gateway.unsubscribe(self.subscription.id());
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::mock::MockGateway;
    use crate::types::{ChannelId, UserId};

    #[tokio::test]
    async fn wait_for_matching_message() {
        let gateway = MockGateway::new();
        let waiter = EventWaiter::new(&gateway);

        let (result, ()) = tokio::join!(
            waiter.wait_for(
                EventKinds::MESSAGE_CREATED,
                |e| e.user_id() == Some(UserId(5)),
                Some(Duration::from_secs(10)),
            ),
            async {
                gateway.subscribed().await;
                gateway.say(ChannelId(1), UserId(4), "ignored");
                gateway.say(ChannelId(1), UserId(5), "hello");
            }
        );

        let event = result.unwrap().into_event().unwrap();
        assert!(matches!(event, Event::MessageCreated(m) if m.content == "hello"));
        assert_eq!(gateway.active_subscriptions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_times_out_and_unsubscribes() {
        let gateway = MockGateway::new();
        let waiter = EventWaiter::new(&gateway);
        let result = waiter
            .wait_for(EventKinds::all(), |_| true, Some(Duration::from_secs(3)))
            .await
            .unwrap();
        assert!(result.is_timeout());
        assert_eq!(gateway.active_subscriptions(), 0);
        assert_eq!(gateway.subscribe_count(), 1);
    }

    #[tokio::test]
    async fn disconnect_is_connection_lost() {
        let gateway = MockGateway::new();
        let waiter = EventWaiter::new(&gateway);

        let (result, ()) = tokio::join!(
            waiter.wait_for(EventKinds::all(), |_| true, None),
            async {
                gateway.subscribed().await;
                gateway.disconnect();
            }
        );

        assert!(result.unwrap_err().is_connection_lost());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_wait_still_unsubscribes() {
        let gateway = MockGateway::new();
        let waiter = EventWaiter::new(&gateway);
        let wait = waiter.wait_for(EventKinds::all(), |_| true, None);
        let _ = tokio::time::timeout(Duration::from_millis(10), wait).await;
        assert_eq!(gateway.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn listener_buffers_in_order() {
        let gateway = MockGateway::new();
        let waiter = EventWaiter::new(&gateway);
        let mut listener = waiter.listen(EventKinds::MESSAGE_CREATED, |_| true);
        assert_eq!(gateway.active_subscriptions(), 1);

        gateway.say(ChannelId(1), UserId(2), "one");
        gateway.say(ChannelId(1), UserId(2), "two");

        for expected in ["one", "two"] {
            let event = listener.next(Deadline::never()).await.unwrap().into_event();
            assert!(matches!(event, Some(Event::MessageCreated(m)) if m.content == expected));
        }

        drop(listener);
        assert_eq!(gateway.active_subscriptions(), 0);
    }
}
