//! Session lifecycle management.
//!
//! This module tracks the session state machine and notifies observers of transitions, and
//! defines what happens to the session message once the session is over.

use std::fmt;

use crate::error::{InteractError, Result};
use crate::types::{Content, SessionState, StopReason};

/// What to do with the session message during cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Disposition {
    /// Leave it as it is.
    #[default]
    Keep,
    /// Replace its content.
    Edit(Content),
    /// Delete it.
    Delete,
}

/// Lifecycle events that can occur during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Session state changed.
    StateChanged(SessionState),
    /// An action handler is about to run.
    Dispatched {
        /// Debug rendering of the action.
        action: String,
    },
    /// The event loop ended.
    Finished(StopReason),
}

/// Callback type for lifecycle events.
pub type LifecycleCallback = Box<dyn Fn(&LifecycleEvent) + Send + Sync>;

/// Tracks a session's state and notifies observers.
pub struct Lifecycle {
    /// Registered callbacks.
    callbacks: Vec<LifecycleCallback>,
    /// Current state.
    state: SessionState,
}

impl Lifecycle {
    /// Create a lifecycle in [`SessionState::Created`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
            state: SessionState::Created,
        }
    }

    /// Register a lifecycle callback.
    pub fn on_event(&mut self, callback: LifecycleCallback) {
        self.callbacks.push(callback);
    }

    /// Emit a lifecycle event.
    pub fn emit(&self, event: &LifecycleEvent) {
        for callback in &self.callbacks {
            callback(event);
        }
    }

    /// Get the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Fail with [`InteractError::InvalidState`] unless the state is `expected`.
    pub fn require(&self, expected: SessionState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(InteractError::invalid_state(operation, self.state))
        }
    }

    /// Move to a later state. Moving backwards or staying put is ignored.
    pub fn advance(&mut self, next: SessionState) {
        if next <= self.state {
            return;
        }
        tracing::debug!(from = %self.state, to = %next, "session state");
        self.state = next;
        self.emit(&LifecycleEvent::StateChanged(next));
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn states_only_advance() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(SessionState::Running);
        lifecycle.advance(SessionState::Starting);
        assert_eq!(lifecycle.state(), SessionState::Running);
        lifecycle.advance(SessionState::Stopped);
        lifecycle.advance(SessionState::Running);
        assert_eq!(lifecycle.state(), SessionState::Stopped);
    }

    #[test]
    fn require_reports_current_state() {
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.require(SessionState::Created, "start").is_ok());
        lifecycle.advance(SessionState::Stopped);
        let err = lifecycle
            .require(SessionState::Created, "start")
            .unwrap_err();
        assert!(matches!(
            err,
            InteractError::InvalidState {
                state: SessionState::Stopped,
                ..
            }
        ));
    }

    #[test]
    fn callbacks_see_transitions() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut lifecycle = Lifecycle::new();
        let sink = Arc::clone(&seen);
        lifecycle.on_event(Box::new(move |event| sink.lock().unwrap().push(event.clone())));

        lifecycle.advance(SessionState::Starting);
        lifecycle.advance(SessionState::Starting);
        lifecycle.emit(&LifecycleEvent::Finished(StopReason::TimedOut));

        assert_eq!(
            *seen.lock().unwrap(),
            [
                LifecycleEvent::StateChanged(SessionState::Starting),
                LifecycleEvent::Finished(StopReason::TimedOut),
            ]
        );
    }
}
