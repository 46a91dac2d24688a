//! What an action handler can see and do.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::Result;
use crate::gateway::Gateway;
use crate::types::{Content, InvocationContext, MessageHandle, SessionId};

/// Requests a running session to stop.
///
/// Cloneable and usable from any task. Stopping is idempotent; an action handler that is
/// already running finishes, and nothing is dispatched after it.
#[derive(Debug, Clone)]
pub struct StopHandle {
    signal: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Create a handle that has not been triggered.
    #[must_use]
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            signal: Arc::new(signal),
        }
    }

    /// Ask the session to stop.
    pub fn stop(&self) {
        self.signal.send_replace(true);
    }

    /// Check if a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.signal.borrow()
    }

    /// Complete once a stop has been requested.
    pub async fn stopped(&self) {
        let mut receiver = self.signal.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// The view of a running session handed to action handlers.
#[derive(Debug)]
pub struct SessionContext<'a, G> {
    gateway: &'a G,
    invocation: &'a InvocationContext,
    message: &'a MessageHandle,
    stop: &'a StopHandle,
    session_id: SessionId,
}

impl<'a, G: Gateway> SessionContext<'a, G> {
    /// Assemble a context.
    #[must_use]
    pub const fn new(
        gateway: &'a G,
        invocation: &'a InvocationContext,
        message: &'a MessageHandle,
        stop: &'a StopHandle,
        session_id: SessionId,
    ) -> Self {
        Self {
            gateway,
            invocation,
            message,
            stop,
            session_id,
        }
    }

    /// The gateway, for calls not covered by the helpers below.
    #[must_use]
    pub const fn gateway(&self) -> &'a G {
        self.gateway
    }

    /// Who invoked the session, and where.
    #[must_use]
    pub const fn invocation(&self) -> &'a InvocationContext {
        self.invocation
    }

    /// The session's message.
    #[must_use]
    pub const fn message(&self) -> &'a MessageHandle {
        self.message
    }

    /// The session id.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Stop the session after the current handler returns.
    pub fn stop(&self) {
        tracing::debug!(session_id = %self.session_id, "stop requested by handler");
        self.stop.stop();
    }

    /// A handle that can stop the session from elsewhere.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Replace the session message's content.
    pub async fn edit(&self, content: &Content) -> Result<()> {
        self.gateway.edit(self.message, content).await?;
        Ok(())
    }

    /// Send a separate message to the invoking channel.
    pub async fn reply(&self, content: impl Into<Content>) -> Result<MessageHandle> {
        let content = content.into();
        Ok(self.gateway.send(self.invocation.channel, &content).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn stop_is_idempotent() {
        let handle = StopHandle::new();
        assert!(!handle.is_stopped());
        handle.stop();
        handle.stop();
        assert!(handle.is_stopped());
        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_wakes_waiters_from_clones() {
        let handle = StopHandle::new();
        let remote = handle.clone();
        let (waited, ()) = tokio::join!(
            tokio::time::timeout(Duration::from_secs(5), handle.stopped()),
            async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                remote.stop();
            }
        );
        assert!(waited.is_ok());
    }
}
