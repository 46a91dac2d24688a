//! Error types for chat-interact.
//!
//! This module defines all error types used throughout the library. The taxonomy separates
//! programming errors ([`InteractError::InvalidState`], [`InteractError::InvalidArgument`]),
//! recoverable outcomes ([`InteractError::TimedOut`]) and failures coming from the host
//! transport or from user-supplied handlers.

use std::time::Duration;

use thiserror::Error;

use crate::types::SessionState;

/// Format a timeout error message.
fn format_timeout_error(duration: Option<&Duration>, waiting_for: &str) -> String {
    match duration {
        Some(duration) => format!("timed out after {duration:?} waiting for {waiting_for}"),
        None => format!("timed out waiting for {waiting_for}"),
    }
}

/// The main error type for chat-interact operations.
#[derive(Debug, Error)]
pub enum InteractError {
    /// An operation was attempted in a state that does not allow it.
    #[error("cannot {operation} a session that is {state}")]
    InvalidState {
        /// What was attempted (e.g. "start", "dispatch to").
        operation: &'static str,
        /// The state the session was in.
        state: SessionState,
    },

    /// A caller-supplied argument was rejected.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What is wrong with the argument.
        message: String,
    },

    /// Two select choices share the same button glyph.
    #[error("ambiguous choice: button {glyph} is used by more than one choice")]
    AmbiguousChoice {
        /// The glyph that appears more than once.
        glyph: String,
    },

    /// A trigger pattern failed to compile.
    #[error("invalid trigger pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as written.
        pattern: String,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// No matching event arrived within the wait window.
    #[error("{}", format_timeout_error(duration.as_ref(), waiting_for))]
    TimedOut {
        /// The window that elapsed, if one was configured.
        duration: Option<Duration>,
        /// A description of what was awaited.
        waiting_for: String,
    },

    /// The transport's event stream closed while a wait was outstanding.
    #[error("connection to the gateway was lost while waiting for events")]
    ConnectionLost,

    /// A user-supplied handler failed. Session cleanup has already run.
    #[error("handler for {action} failed: {source}")]
    HandlerFailure {
        /// The action whose handler failed.
        action: String,
        /// The error the handler returned.
        #[source]
        source: Box<InteractError>,
    },

    /// A gateway call failed.
    #[error("gateway error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Errors reported by a [`Gateway`](crate::gateway::Gateway) implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The target message, channel or reaction no longer exists.
    #[error("not found: {what}")]
    NotFound {
        /// What could not be found.
        what: String,
    },

    /// The bot lacks the permission required for the call.
    #[error("missing permission: {permission}")]
    Forbidden {
        /// The permission that was missing.
        permission: String,
    },

    /// The platform rejected the request.
    #[error("request failed ({status}): {message}")]
    Request {
        /// Status code reported by the platform.
        status: u16,
        /// Message reported by the platform.
        message: String,
    },

    /// The gateway is not connected.
    #[error("gateway disconnected")]
    Disconnected,
}

/// Result type alias for chat-interact operations.
pub type Result<T> = std::result::Result<T, InteractError>;

impl InteractError {
    /// Create an invalid state error.
    #[must_use]
    pub const fn invalid_state(operation: &'static str, state: SessionState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timed_out(duration: Option<Duration>, waiting_for: impl Into<String>) -> Self {
        Self::TimedOut {
            duration,
            waiting_for: waiting_for.into(),
        }
    }

    /// Wrap an error returned by a handler.
    pub fn handler_failure(action: impl Into<String>, source: Self) -> Self {
        Self::HandlerFailure {
            action: action.into(),
            source: Box::new(source),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Check if this error rejects a caller-supplied argument.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::AmbiguousChoice { .. } | Self::InvalidPattern { .. }
        )
    }

    /// Check if this is an invalid state error.
    #[must_use]
    pub const fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    /// Check if the transport dropped its event stream.
    #[must_use]
    pub const fn is_connection_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost)
    }

    /// Get the error a failing handler returned, if this wraps one.
    #[must_use]
    pub fn handler_source(&self) -> Option<&Self> {
        match self {
            Self::HandlerFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl TransportError {
    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a missing permission error.
    pub fn forbidden(permission: impl Into<String>) -> Self {
        Self::Forbidden {
            permission: permission.into(),
        }
    }

    /// Create a request error.
    pub fn request(status: u16, message: impl Into<String>) -> Self {
        Self::Request {
            status,
            message: message.into(),
        }
    }
}
