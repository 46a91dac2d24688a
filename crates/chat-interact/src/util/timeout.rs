//! Timeout utilities.
//!
//! Sessions use an inactivity window that restarts after every dispatched event; prompts use a
//! single absolute deadline. Both are expressed with [`Deadline`], where "no timeout" is a
//! deadline that never expires.

use std::time::Duration;

use tokio::time::Instant;

/// A point in time after which a wait gives up. May be "never".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    deadline: Option<Instant>,
}

impl Deadline {
    /// Create a new deadline from now.
    #[must_use]
    pub fn from_now(duration: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + duration),
        }
    }

    /// Create a deadline that never expires.
    #[must_use]
    pub const fn never() -> Self {
        Self { deadline: None }
    }

    /// Create a deadline from an optional timeout; `None` never expires.
    #[must_use]
    pub fn after(timeout: Option<Duration>) -> Self {
        timeout.map_or_else(Self::never, Self::from_now)
    }

    /// Get the remaining time, or `None` if the deadline never expires.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Sleep until the deadline. Never completes for [`Deadline::never`].
    pub async fn sleep(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

/// A sliding inactivity window.
///
/// The window restarts on [`reset`](Self::reset); it expires only when a full window passes
/// without a reset.
#[derive(Debug, Clone, Copy)]
pub struct InactivityTimer {
    window: Option<Duration>,
    deadline: Deadline,
}

impl InactivityTimer {
    /// Start a window. `None` disables the timeout.
    #[must_use]
    pub fn start(window: Option<Duration>) -> Self {
        Self {
            window,
            deadline: Deadline::after(window),
        }
    }

    /// Restart the window from now.
    pub fn reset(&mut self) {
        self.deadline = Deadline::after(self.window);
    }

    /// The configured window length.
    #[must_use]
    pub const fn window(&self) -> Option<Duration> {
        self.window
    }

    /// The current expiry point.
    #[must_use]
    pub const fn deadline(&self) -> Deadline {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_remaining() {
        let deadline = Deadline::from_now(Duration::from_secs(10));
        assert_eq!(deadline.remaining(), Some(Duration::from_secs(10)));
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(deadline.remaining(), Some(Duration::from_secs(6)));
    }

    #[tokio::test]
    async fn never_deadline() {
        let deadline = Deadline::after(None);
        assert_eq!(deadline, Deadline::never());
        assert!(deadline.remaining().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_sleep_expires() {
        let deadline = Deadline::from_now(Duration::from_secs(3));
        deadline.sleep().await;
        assert_eq!(deadline.remaining(), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn inactivity_timer_slides_on_reset() {
        let mut timer = InactivityTimer::start(Some(Duration::from_secs(5)));
        tokio::time::advance(Duration::from_secs(4)).await;
        timer.reset();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(timer.deadline().remaining(), Some(Duration::from_secs(1)));
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(timer.deadline().remaining(), Some(Duration::ZERO));
    }
}
