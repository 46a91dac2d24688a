//! The session engine.
//!
//! A [`Session`] owns one message and one subscription for its whole life. [`Session::start`]
//! runs the full cycle: send the initial message, attach the buttons, dispatch matching events
//! to the interaction until something ends the session, then clean up. Hosts that already own
//! an event loop can drive the same cycle by hand with [`Session::open`],
//! [`Session::dispatch`] and [`Session::close`].

use tracing::Instrument;

use super::context::{SessionContext, StopHandle};
use super::interaction::Interaction;
use super::lifecycle::{Disposition, Lifecycle, LifecycleCallback, LifecycleEvent};
use crate::config::{AllowedUsers, SessionConfig};
use crate::error::{InteractError, Result};
use crate::gateway::{EventKinds, Gateway};
use crate::types::{
    Emoji, Event, InvocationContext, MessageHandle, SessionId, SessionState, StopReason, UserId,
};
use crate::util::timeout::InactivityTimer;
use crate::waiter::{EventWaiter, Listener, WaitResult};

/// Outcome of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// An action handler ran.
    Handled,
    /// The event was out of scope or matched no trigger.
    Ignored,
    /// The session should end now.
    Ended(StopReason),
}

/// Which events belong to a session.
#[derive(Debug, Clone)]
struct Scope {
    message: MessageHandle,
    author: UserId,
    bot: UserId,
    allowed: AllowedUsers,
}

impl Scope {
    fn permits(&self, user: UserId) -> bool {
        user != self.bot && self.allowed.permits(self.author, user)
    }

    fn admits(&self, event: &Event) -> bool {
        match event {
            Event::ReactionAdded(reaction) | Event::ReactionRemoved(reaction) => {
                reaction.message_id == self.message.id && self.permits(reaction.user_id)
            }
            Event::MessageCreated(message) => {
                message.channel_id == self.message.channel_id && self.permits(message.author_id)
            }
            Event::MessageDeleted { id, .. } => *id == self.message.id,
        }
    }
}

/// An interactive session bound to one message.
pub struct Session<'g, G: Gateway, I: Interaction> {
    id: SessionId,
    gateway: &'g G,
    invocation: InvocationContext,
    interaction: I,
    config: SessionConfig,
    lifecycle: Lifecycle,
    stop: StopHandle,
    scope: Option<Scope>,
    added_reactions: Vec<Emoji>,
}

impl<'g, G: Gateway, I: Interaction> Session<'g, G, I> {
    /// Create a session with the default config.
    pub fn new(gateway: &'g G, invocation: InvocationContext, interaction: I) -> Self {
        Self {
            id: SessionId::new(),
            gateway,
            invocation,
            interaction,
            config: SessionConfig::default(),
            lifecycle: Lifecycle::new(),
            stop: StopHandle::new(),
            scope: None,
            added_reactions: Vec::new(),
        }
    }

    /// Replace the config.
    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a lifecycle observer.
    pub fn on_event(&mut self, callback: LifecycleCallback) {
        self.lifecycle.on_event(callback);
    }

    /// Get the session id.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Get the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    /// Check if the session is dispatching events.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.lifecycle.state().is_running()
    }

    /// The session message, between the initial send and cleanup.
    #[must_use]
    pub fn message(&self) -> Option<MessageHandle> {
        self.scope.as_ref().map(|scope| scope.message)
    }

    /// Get the config.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the invocation context.
    #[must_use]
    pub const fn invocation(&self) -> &InvocationContext {
        &self.invocation
    }

    /// A handle that stops this session from another task.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Get the interaction.
    #[must_use]
    pub const fn interaction(&self) -> &I {
        &self.interaction
    }

    /// Get the interaction mutably.
    pub fn interaction_mut(&mut self) -> &mut I {
        &mut self.interaction
    }

    /// Consume the session and return the interaction.
    pub fn into_interaction(self) -> I {
        self.interaction
    }

    /// Run the session to completion.
    ///
    /// Returns why the session ended. Cleanup has always run by the time this returns,
    /// including when it returns an error.
    ///
    /// # Errors
    ///
    /// - [`InteractError::InvalidState`] if the session was started before.
    /// - Any error from rendering or sending the initial message; nothing needs cleaning up.
    /// - [`InteractError::ConnectionLost`] if the gateway drops the event stream.
    /// - [`InteractError::HandlerFailure`] if an action handler or the timeout hook fails.
    pub async fn start(&mut self) -> Result<StopReason> {
        self.lifecycle.require(SessionState::Created, "start")?;
        let span = tracing::info_span!(
            "session",
            session_id = %self.id,
            author = %self.invocation.author,
            channel = %self.invocation.channel,
        );
        self.run().instrument(span).await
    }

    async fn run(&mut self) -> Result<StopReason> {
        let scope = self.send_initial().await?;
        let mut listener = EventWaiter::new(self.gateway)
            .listen(EventKinds::all(), move |event| scope.admits(event));
        self.attach_buttons().await;
        self.lifecycle.advance(SessionState::Running);

        let outcome = self.event_loop(&mut listener).await;
        drop(listener);

        let reason = outcome.as_ref().map_or(StopReason::Stopped, |reason| *reason);
        if let Err(error) = &outcome {
            tracing::debug!(%error, "event loop failed");
        }
        let closed = self.close(reason).await;
        let reason = outcome?;
        closed?;
        Ok(reason)
    }

    async fn event_loop(&mut self, listener: &mut Listener<'g, G>) -> Result<StopReason> {
        let mut timer = InactivityTimer::start(self.config.timeout);
        loop {
            let event = tokio::select! {
                biased;
                () = self.stop.stopped() => return Ok(StopReason::Stopped),
                waited = listener.next(timer.deadline()) => match waited? {
                    WaitResult::Matched(event) => event,
                    WaitResult::Timeout => {
                        tracing::debug!(timeout = ?timer.window(), "inactivity timeout");
                        return Ok(StopReason::TimedOut);
                    }
                },
            };

            match self.dispatch(&event).await? {
                Dispatch::Handled => timer.reset(),
                Dispatch::Ignored => {}
                Dispatch::Ended(reason) => return Ok(reason),
            }
        }
    }

    /// Send the initial message and attach the buttons without starting an event loop.
    ///
    /// Feed events with [`dispatch`](Self::dispatch) and finish with [`close`](Self::close).
    pub async fn open(&mut self) -> Result<MessageHandle> {
        self.lifecycle.require(SessionState::Created, "open")?;
        let scope = self.send_initial().await?;
        self.attach_buttons().await;
        self.lifecycle.advance(SessionState::Running);
        Ok(scope.message)
    }

    async fn send_initial(&mut self) -> Result<Scope> {
        self.lifecycle.advance(SessionState::Starting);

        let content = match self.interaction.render_initial().await {
            Ok(content) => content,
            Err(error) => return Err(self.abort(error)),
        };
        let message = match self.gateway.send(self.invocation.channel, &content).await {
            Ok(message) => message,
            Err(error) => return Err(self.abort(error.into())),
        };
        tracing::debug!(message_id = %message.id, "initial message sent");

        let scope = Scope {
            message,
            author: self.invocation.author,
            bot: self.gateway.current_user(),
            allowed: self.config.allowed_users.clone(),
        };
        self.scope = Some(scope.clone());
        Ok(scope)
    }

    fn abort(&mut self, error: InteractError) -> InteractError {
        tracing::debug!(%error, "session failed to start");
        self.lifecycle.advance(SessionState::Stopped);
        error
    }

    async fn attach_buttons(&mut self) {
        let Some(message) = self.message() else {
            return;
        };
        let buttons: Vec<Emoji> = self.interaction.actions().buttons().cloned().collect();
        for emoji in buttons {
            match self.gateway.add_reaction(&message, &emoji).await {
                Ok(()) => self.added_reactions.push(emoji),
                Err(error) => tracing::warn!(%emoji, %error, "failed to add reaction"),
            }
        }
    }

    /// Dispatch one event to the interaction.
    ///
    /// Events outside the session's scope (other messages, other channels, users that are not
    /// allowed, the bot itself) are ignored.
    ///
    /// # Errors
    ///
    /// - [`InteractError::InvalidState`] unless the session is running.
    /// - [`InteractError::HandlerFailure`] if the handler fails. The session is still running;
    ///   call [`close`](Self::close) to clean up.
    pub async fn dispatch(&mut self, event: &Event) -> Result<Dispatch> {
        self.lifecycle.require(SessionState::Running, "dispatch to")?;
        let Some(scope) = &self.scope else {
            return Err(InteractError::invalid_state("dispatch to", self.state()));
        };
        if self.stop.is_stopped() {
            return Ok(Dispatch::Ended(StopReason::Stopped));
        }
        if !scope.admits(event) {
            return Ok(Dispatch::Ignored);
        }
        if matches!(event, Event::MessageDeleted { .. }) {
            tracing::debug!("session message deleted");
            return Ok(Dispatch::Ended(StopReason::MessageDeleted));
        }
        let message = scope.message;

        let Some((action, payload)) = self.interaction.actions().resolve(event) else {
            tracing::trace!("event matched no trigger");
            return Ok(Dispatch::Ignored);
        };

        tracing::debug!(?action, user = %payload.user_id(), "dispatching");
        self.lifecycle.emit(&LifecycleEvent::Dispatched {
            action: format!("{action:?}"),
        });
        let cx = SessionContext::new(self.gateway, &self.invocation, &message, &self.stop, self.id);
        self.interaction
            .handle(action, payload, &cx)
            .await
            .map_err(|error| InteractError::handler_failure(format!("{action:?}"), error))?;

        if self.stop.is_stopped() {
            Ok(Dispatch::Ended(StopReason::Stopped))
        } else {
            Ok(Dispatch::Handled)
        }
    }

    /// End a running session and clean up.
    ///
    /// Runs the timeout hook when `reason` is [`StopReason::TimedOut`], then removes the
    /// bot's reactions and applies the configured [`Disposition`]. Cleanup failures are logged
    /// and swallowed. When the message was deleted nothing touches it.
    ///
    /// # Errors
    ///
    /// - [`InteractError::InvalidState`] unless the session is running.
    /// - [`InteractError::HandlerFailure`] if the timeout hook fails; cleanup has still run.
    pub async fn close(&mut self, reason: StopReason) -> Result<()> {
        self.lifecycle.require(SessionState::Running, "close")?;
        let Some(message) = self.message() else {
            return Err(InteractError::invalid_state("close", self.state()));
        };
        self.stop.stop();
        self.lifecycle.advance(SessionState::Stopping);
        self.lifecycle.emit(&LifecycleEvent::Finished(reason));
        tracing::debug!(%reason, "session finished");

        let hook = if reason == StopReason::TimedOut {
            let cx =
                SessionContext::new(self.gateway, &self.invocation, &message, &self.stop, self.id);
            self.interaction
                .on_timeout(&cx)
                .await
                .map_err(|error| InteractError::handler_failure("on_timeout", error))
        } else {
            Ok(())
        };

        self.cleanup(message, reason == StopReason::MessageDeleted)
            .await;
        self.scope = None;
        self.lifecycle.advance(SessionState::Stopped);
        hook
    }

    async fn cleanup(&mut self, message: MessageHandle, deleted: bool) {
        let added = std::mem::take(&mut self.added_reactions);
        if deleted {
            tracing::debug!("message is gone, skipping cleanup");
            return;
        }

        if self.config.disposition == Disposition::Delete {
            if let Err(error) = self.gateway.delete(&message).await {
                tracing::warn!(%error, "failed to delete session message");
            }
            return;
        }

        if self.config.clear_reactions {
            if let Err(error) = self.gateway.clear_reactions(&message).await {
                tracing::warn!(%error, "failed to clear reactions");
            }
        } else {
            for emoji in &added {
                if let Err(error) = self.gateway.remove_reaction(&message, emoji).await {
                    tracing::debug!(%emoji, %error, "failed to remove reaction");
                }
            }
        }

        if let Disposition::Edit(content) = &self.config.disposition {
            if let Err(error) = self.gateway.edit(&message, content).await {
                tracing::warn!(%error, "failed to edit session message");
            }
        }
    }
}

impl<G: Gateway, I: Interaction> std::fmt::Debug for Session<'_, G, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.lifecycle.state())
            .field("message", &self.message())
            .field("config", &self.config)
            .finish()
    }
}
