//! The host transport boundary.
//!
//! The engine never talks to a chat platform directly. Hosts implement [`Gateway`] on top of
//! whatever client they already run; the engine only needs to send, edit and delete messages,
//! manage reactions, and subscribe to a filtered slice of the gateway's event stream.
//!
//! [`EventHub`] is a ready-made publish/subscribe fan-out that a [`Gateway`] implementation can
//! embed: the host's event loop calls [`EventHub::publish`] for every incoming event, and the
//! hub routes it to each live subscription whose kinds and predicate match.

mod hub;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bitflags::bitflags;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::types::{ChannelId, Content, Emoji, Event, MessageHandle, UserId};

pub use hub::EventHub;

/// Predicate applied to events before they reach a subscription.
pub type EventPredicate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

bitflags! {
    /// A set of event kinds to subscribe to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventKinds: u8 {
        /// [`Event::ReactionAdded`].
        const REACTION_ADDED = 1 << 0;
        /// [`Event::ReactionRemoved`].
        const REACTION_REMOVED = 1 << 1;
        /// [`Event::MessageCreated`].
        const MESSAGE_CREATED = 1 << 2;
        /// [`Event::MessageDeleted`].
        const MESSAGE_DELETED = 1 << 3;
    }
}

impl EventKinds {
    /// Get the kind of a single event.
    #[must_use]
    pub const fn of(event: &Event) -> Self {
        match event {
            Event::ReactionAdded(_) => Self::REACTION_ADDED,
            Event::ReactionRemoved(_) => Self::REACTION_REMOVED,
            Event::MessageCreated(_) => Self::MESSAGE_CREATED,
            Event::MessageDeleted { .. } => Self::MESSAGE_DELETED,
        }
    }

    /// Check if this set includes the kind of `event`.
    #[must_use]
    pub const fn accepts(self, event: &Event) -> bool {
        self.contains(Self::of(event))
    }
}

/// Identifier of a live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// The receiving end of a subscription.
///
/// Events arrive in the order the gateway delivered them. When the gateway drops the sending
/// side (disconnect), [`Subscription::recv`] returns `None`.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    events: mpsc::UnboundedReceiver<Event>,
}

impl Subscription {
    /// Create a subscription from its id and event channel.
    #[must_use]
    pub const fn new(id: SubscriptionId, events: mpsc::UnboundedReceiver<Event>) -> Self {
        Self { id, events }
    }

    /// Get the subscription id.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Receive the next event, or `None` once the gateway has closed the stream.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }
}

/// The host transport, as seen by the engine.
///
/// Implementations must be cheap to share by reference across concurrent sessions. Outgoing
/// calls are expected to already handle rate limits and retries.
pub trait Gateway: Send + Sync {
    /// The bot's own user id. Events caused by this user are never dispatched to handlers.
    fn current_user(&self) -> UserId;

    /// Send a new message.
    fn send(
        &self,
        channel: ChannelId,
        content: &Content,
    ) -> impl Future<Output = Result<MessageHandle, TransportError>> + Send;

    /// Replace a message's content.
    fn edit(
        &self,
        message: &MessageHandle,
        content: &Content,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Delete a message.
    fn delete(
        &self,
        message: &MessageHandle,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Add a reaction as the bot.
    fn add_reaction(
        &self,
        message: &MessageHandle,
        emoji: &Emoji,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Remove the bot's own reaction.
    fn remove_reaction(
        &self,
        message: &MessageHandle,
        emoji: &Emoji,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Remove every reaction from a message.
    fn clear_reactions(
        &self,
        message: &MessageHandle,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Whether the bot may add reactions in `channel`.
    fn can_add_reactions(&self, channel: ChannelId) -> impl Future<Output = bool> + Send {
        let _ = channel;
        async { true }
    }

    /// Start receiving events of the given kinds that satisfy `predicate`.
    fn subscribe(&self, kinds: EventKinds, predicate: EventPredicate) -> Subscription;

    /// Stop delivering events to a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, subscription: SubscriptionId);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MessageId, ReactionEvent};

    fn reaction() -> ReactionEvent {
        ReactionEvent {
            message_id: MessageId(1),
            channel_id: ChannelId(2),
            guild_id: None,
            user_id: UserId(3),
            emoji: Emoji::unicode("\u{25B6}"),
        }
    }

    #[test]
    fn kinds_of_events() {
        let added = Event::ReactionAdded(reaction());
        let removed = Event::ReactionRemoved(reaction());
        assert_eq!(EventKinds::of(&added), EventKinds::REACTION_ADDED);
        assert_eq!(EventKinds::of(&removed), EventKinds::REACTION_REMOVED);

        let kinds = EventKinds::REACTION_ADDED | EventKinds::MESSAGE_CREATED;
        assert!(kinds.accepts(&added));
        assert!(!kinds.accepts(&removed));
    }

    #[tokio::test]
    async fn subscription_ends_when_sender_drops() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscription = Subscription::new(SubscriptionId(7), rx);
        tx.send(Event::ReactionAdded(reaction())).unwrap();
        drop(tx);

        assert_eq!(subscription.id(), SubscriptionId(7));
        assert!(subscription.recv().await.is_some());
        assert!(subscription.recv().await.is_none());
    }
}
