//! Mock gateway implementation for testing.

use std::collections::BTreeMap;
use std::pin::pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::error::TransportError;
use crate::gateway::{EventHub, EventKinds, EventPredicate, Gateway, Subscription, SubscriptionId};
use crate::types::{
    ChannelId, Content, Emoji, Event, MessageEvent, MessageHandle, MessageId, ReactionEvent,
    UserId,
};

/// An outgoing call recorded by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// `send`
    Send {
        /// Target channel.
        channel: ChannelId,
        /// Content sent.
        content: Content,
    },
    /// `edit`
    Edit {
        /// Edited message.
        message: MessageId,
        /// New content.
        content: Content,
    },
    /// `delete`
    Delete {
        /// Deleted message.
        message: MessageId,
    },
    /// `add_reaction`
    AddReaction {
        /// Target message.
        message: MessageId,
        /// Emoji added.
        emoji: Emoji,
    },
    /// `remove_reaction`
    RemoveReaction {
        /// Target message.
        message: MessageId,
        /// Emoji removed.
        emoji: Emoji,
    },
    /// `clear_reactions`
    ClearReactions {
        /// Target message.
        message: MessageId,
    },
    /// `subscribe`
    Subscribe {
        /// Requested kinds.
        kinds: EventKinds,
    },
    /// `unsubscribe`
    Unsubscribe {
        /// Released subscription.
        subscription: SubscriptionId,
    },
}

#[derive(Debug)]
struct MockMessage {
    content: Content,
    reactions: Vec<Emoji>,
    deleted: bool,
}

#[derive(Debug)]
struct MockState {
    next_id: u64,
    calls: Vec<GatewayCall>,
    messages: BTreeMap<MessageId, MockMessage>,
    sent: Vec<MessageHandle>,
    failing_reactions: Vec<Emoji>,
    fail_sends: bool,
    reactions_allowed: bool,
    subscribes: usize,
}

impl MockState {
    const fn new() -> Self {
        Self {
            next_id: 1000,
            calls: Vec::new(),
            messages: BTreeMap::new(),
            sent: Vec::new(),
            failing_reactions: Vec::new(),
            fail_sends: false,
            reactions_allowed: true,
            subscribes: 0,
        }
    }

    fn next_message_id(&mut self) -> MessageId {
        self.next_id += 1;
        MessageId(self.next_id)
    }

    fn live_message(&mut self, id: MessageId) -> Result<&mut MockMessage, TransportError> {
        self.messages
            .get_mut(&id)
            .filter(|m| !m.deleted)
            .ok_or_else(|| TransportError::not_found(format!("message {id}")))
    }
}

/// An in-memory gateway for tests.
///
/// Outgoing calls complete immediately. Tests inject user events with [`react`](Self::react),
/// [`say`](Self::say) and friends, and synchronize with the code under test through the
/// `wait_*` helpers, which resolve as soon as the recorded state satisfies them.
pub struct MockGateway {
    user: UserId,
    hub: EventHub,
    state: Mutex<MockState>,
    changed: Notify,
}

impl MockGateway {
    /// The bot user id used by [`MockGateway::new`].
    pub const BOT: UserId = UserId(1);

    /// Create a mock gateway whose bot user is [`MockGateway::BOT`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_user(Self::BOT)
    }

    /// Create a mock gateway with a specific bot user.
    #[must_use]
    pub fn with_user(user: UserId) -> Self {
        Self {
            user,
            hub: EventHub::new(),
            state: Mutex::new(MockState::new()),
            changed: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: GatewayCall) -> MutexGuard<'_, MockState> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }

    // ----- failure switches -----

    /// Make every `send` fail.
    pub fn fail_sends(&self, fail: bool) {
        self.lock().fail_sends = fail;
    }

    /// Make adding this emoji fail.
    pub fn fail_reaction(&self, emoji: impl Into<Emoji>) {
        self.lock().failing_reactions.push(emoji.into());
    }

    /// Set what `can_add_reactions` reports.
    pub fn set_can_add_reactions(&self, allowed: bool) {
        self.lock().reactions_allowed = allowed;
    }

    /// Drop every subscription and refuse new ones, as a lost connection would.
    pub fn disconnect(&self) {
        self.hub.close();
        self.changed.notify_waiters();
    }

    /// Accept subscriptions again.
    pub fn reconnect(&self) {
        self.hub.reopen();
    }

    // ----- event injection -----

    /// Deliver an event to matching subscriptions. Returns how many received it.
    pub fn emit(&self, event: &Event) -> usize {
        self.hub.publish(event)
    }

    fn reaction(message: &MessageHandle, user: UserId, emoji: impl Into<Emoji>) -> ReactionEvent {
        ReactionEvent {
            message_id: message.id,
            channel_id: message.channel_id,
            guild_id: None,
            user_id: user,
            emoji: emoji.into(),
        }
    }

    /// Build a reaction event on `message`.
    #[must_use]
    pub fn reaction_event(
        &self,
        message: &MessageHandle,
        user: UserId,
        emoji: impl Into<Emoji>,
    ) -> Event {
        Event::ReactionAdded(Self::reaction(message, user, emoji))
    }

    /// Build a message event with a fresh id.
    #[must_use]
    pub fn message_event(&self, channel: ChannelId, user: UserId, text: &str) -> Event {
        Event::MessageCreated(MessageEvent {
            id: self.lock().next_message_id(),
            channel_id: channel,
            guild_id: None,
            author_id: user,
            content: text.to_string(),
        })
    }

    /// A user adds a reaction.
    pub fn react(&self, message: &MessageHandle, user: UserId, emoji: impl Into<Emoji>) -> usize {
        self.emit(&self.reaction_event(message, user, emoji))
    }

    /// A user removes a reaction.
    pub fn unreact(
        &self,
        message: &MessageHandle,
        user: UserId,
        emoji: impl Into<Emoji>,
    ) -> usize {
        self.emit(&Event::ReactionRemoved(Self::reaction(message, user, emoji)))
    }

    /// A user posts a message.
    pub fn say(&self, channel: ChannelId, user: UserId, text: &str) -> usize {
        self.emit(&self.message_event(channel, user, text))
    }

    /// Someone other than the bot deletes a message.
    pub fn delete_externally(&self, message: &MessageHandle) -> usize {
        if let Some(m) = self.lock().messages.get_mut(&message.id) {
            m.deleted = true;
        }
        self.emit(&Event::MessageDeleted {
            id: message.id,
            channel_id: message.channel_id,
        })
    }

    // ----- inspection -----

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    /// Messages sent by the bot, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<MessageHandle> {
        self.lock().sent.clone()
    }

    /// Current content of a message.
    #[must_use]
    pub fn content_of(&self, id: MessageId) -> Option<Content> {
        self.lock().messages.get(&id).map(|m| m.content.clone())
    }

    /// The bot's reactions currently on a message.
    #[must_use]
    pub fn reactions_on(&self, id: MessageId) -> Vec<Emoji> {
        self.lock()
            .messages
            .get(&id)
            .map(|m| m.reactions.clone())
            .unwrap_or_default()
    }

    /// Check if a message was deleted.
    #[must_use]
    pub fn is_deleted(&self, id: MessageId) -> bool {
        self.lock().messages.get(&id).is_some_and(|m| m.deleted)
    }

    /// Number of `edit` calls on a message.
    #[must_use]
    pub fn edit_count(&self, id: MessageId) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, GatewayCall::Edit { message, .. } if *message == id))
            .count()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.hub.subscriber_count()
    }

    /// Number of `subscribe` calls so far.
    #[must_use]
    pub fn subscribe_count(&self) -> usize {
        self.lock().subscribes
    }

    // ----- synchronization -----

    /// Wait until `condition` holds. Re-checked after every recorded call.
    pub async fn wait_until(&self, condition: impl Fn(&Self) -> bool) {
        loop {
            let mut notified = pin!(self.changed.notified());
            notified.as_mut().enable();
            if condition(self) {
                return;
            }
            notified.await;
        }
    }

    /// Wait until at least one subscription is live.
    pub async fn subscribed(&self) {
        self.wait_until(|g| g.active_subscriptions() > 0).await;
    }

    /// Wait for the bot's `index`-th sent message (0-based) and a live subscription.
    pub async fn wait_for_message(&self, index: usize) -> MessageHandle {
        self.wait_until(|g| g.lock().sent.len() > index && g.active_subscriptions() > 0)
            .await;
        self.lock().sent[index]
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGateway")
            .field("user", &self.user)
            .field("hub", &self.hub)
            .finish()
    }
}

impl Gateway for MockGateway {
    fn current_user(&self) -> UserId {
        self.user
    }

    async fn send(
        &self,
        channel: ChannelId,
        content: &Content,
    ) -> Result<MessageHandle, TransportError> {
        let result = {
            let mut state = self.record(GatewayCall::Send {
                channel,
                content: content.clone(),
            });
            if state.fail_sends {
                Err(TransportError::request(500, "send failed"))
            } else {
                let handle = MessageHandle::new(state.next_message_id(), channel);
                state.messages.insert(
                    handle.id,
                    MockMessage {
                        content: content.clone(),
                        reactions: Vec::new(),
                        deleted: false,
                    },
                );
                state.sent.push(handle);
                Ok(handle)
            }
        };
        self.changed.notify_waiters();
        result
    }

    async fn edit(&self, message: &MessageHandle, content: &Content) -> Result<(), TransportError> {
        let result = {
            let mut state = self.record(GatewayCall::Edit {
                message: message.id,
                content: content.clone(),
            });
            state
                .live_message(message.id)
                .map(|m| m.content = content.clone())
        };
        self.changed.notify_waiters();
        result
    }

    async fn delete(&self, message: &MessageHandle) -> Result<(), TransportError> {
        let result = {
            let mut state = self.record(GatewayCall::Delete {
                message: message.id,
            });
            state.live_message(message.id).map(|m| m.deleted = true)
        };
        if result.is_ok() {
            self.hub.publish(&Event::MessageDeleted {
                id: message.id,
                channel_id: message.channel_id,
            });
        }
        self.changed.notify_waiters();
        result
    }

    async fn add_reaction(&self, message: &MessageHandle, emoji: &Emoji) -> Result<(), TransportError> {
        let result = {
            let mut state = self.record(GatewayCall::AddReaction {
                message: message.id,
                emoji: emoji.clone(),
            });
            if state.failing_reactions.contains(emoji) {
                Err(TransportError::forbidden("ADD_REACTIONS"))
            } else {
                state.live_message(message.id).map(|m| {
                    if !m.reactions.contains(emoji) {
                        m.reactions.push(emoji.clone());
                    }
                })
            }
        };
        self.changed.notify_waiters();
        result
    }

    async fn remove_reaction(
        &self,
        message: &MessageHandle,
        emoji: &Emoji,
    ) -> Result<(), TransportError> {
        let result = {
            let mut state = self.record(GatewayCall::RemoveReaction {
                message: message.id,
                emoji: emoji.clone(),
            });
            state.live_message(message.id).and_then(|m| {
                let before = m.reactions.len();
                m.reactions.retain(|e| e != emoji);
                if m.reactions.len() == before {
                    Err(TransportError::not_found(format!("reaction {emoji}")))
                } else {
                    Ok(())
                }
            })
        };
        self.changed.notify_waiters();
        result
    }

    async fn clear_reactions(&self, message: &MessageHandle) -> Result<(), TransportError> {
        let result = {
            let mut state = self.record(GatewayCall::ClearReactions {
                message: message.id,
            });
            state.live_message(message.id).map(|m| m.reactions.clear())
        };
        self.changed.notify_waiters();
        result
    }

    async fn can_add_reactions(&self, _channel: ChannelId) -> bool {
        self.lock().reactions_allowed
    }

    fn subscribe(&self, kinds: EventKinds, predicate: EventPredicate) -> Subscription {
        {
            let mut state = self.record(GatewayCall::Subscribe { kinds });
            state.subscribes += 1;
        }
        let subscription = self.hub.subscribe(kinds, predicate);
        self.changed.notify_waiters();
        subscription
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        drop(self.record(GatewayCall::Unsubscribe { subscription }));
        self.hub.unsubscribe(subscription);
        self.changed.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn send_edit_delete() {
        let gateway = MockGateway::new();
        let message = gateway
            .send(ChannelId(5), &Content::text("hello"))
            .await
            .unwrap();
        assert_eq!(message.channel_id, ChannelId(5));

        gateway.edit(&message, &Content::text("bye")).await.unwrap();
        assert_eq!(gateway.content_of(message.id), Some(Content::text("bye")));
        assert_eq!(gateway.edit_count(message.id), 1);

        gateway.delete(&message).await.unwrap();
        assert!(gateway.is_deleted(message.id));
        assert!(gateway.edit(&message, &Content::text("x")).await.is_err());
    }

    #[tokio::test]
    async fn reactions_and_failures() {
        let gateway = MockGateway::new();
        gateway.fail_reaction("\u{274C}");
        let message = gateway.send(ChannelId(5), &"q".into()).await.unwrap();

        gateway.add_reaction(&message, &"\u{2705}".into()).await.unwrap();
        assert!(gateway.add_reaction(&message, &"\u{274C}".into()).await.is_err());
        assert_eq!(gateway.reactions_on(message.id), [Emoji::unicode("\u{2705}")]);

        assert!(gateway.remove_reaction(&message, &"\u{274C}".into()).await.is_err());
        gateway.clear_reactions(&message).await.unwrap();
        assert!(gateway.reactions_on(message.id).is_empty());
    }

    #[tokio::test]
    async fn events_reach_subscribers() {
        let gateway = MockGateway::new();
        let mut subscription = gateway.subscribe(EventKinds::all(), Arc::new(|_| true));
        assert_eq!(gateway.say(ChannelId(1), UserId(2), "hi"), 1);
        assert!(matches!(
            subscription.recv().await,
            Some(Event::MessageCreated(m)) if m.content == "hi"
        ));

        gateway.unsubscribe(subscription.id());
        assert_eq!(gateway.active_subscriptions(), 0);
        assert_eq!(gateway.subscribe_count(), 1);
        assert!(matches!(gateway.calls().last(), Some(GatewayCall::Unsubscribe { .. })));
    }

    #[tokio::test]
    async fn failing_sends() {
        let gateway = MockGateway::new();
        gateway.fail_sends(true);
        assert!(gateway.send(ChannelId(1), &"x".into()).await.is_err());
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn wait_for_message_sees_later_sends() {
        let gateway = MockGateway::new();
        let _subscription = gateway.subscribe(EventKinds::all(), Arc::new(|_| true));
        let (handle, ()) = tokio::join!(gateway.wait_for_message(0), async {
            tokio::task::yield_now().await;
            gateway.send(ChannelId(3), &"x".into()).await.unwrap();
        });
        assert_eq!(handle.channel_id, ChannelId(3));
    }
}
