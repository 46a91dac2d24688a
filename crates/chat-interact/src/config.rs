//! Configuration types for chat-interact.
//!
//! This module defines the per-session, per-prompt and paginator settings. All of them have
//! builder-style setters and sensible defaults; [`InteractConfig`] loads the same settings from
//! a TOML file and [`EnvConfig`] from `CHAT_INTERACT_*` environment variables.

pub mod env;
pub mod file;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::session::Disposition;
use crate::types::{Emoji, UserId};

pub use env::EnvConfig;
pub use file::InteractConfig;

/// Default glyph for jumping to the first page.
pub const FIRST_EMOJI: &str = "\u{23EE}";
/// Default glyph for the previous page.
pub const PREVIOUS_EMOJI: &str = "\u{25C0}";
/// Default glyph for the next page.
pub const NEXT_EMOJI: &str = "\u{25B6}";
/// Default glyph for jumping to the last page.
pub const LAST_EMOJI: &str = "\u{23ED}";
/// Default glyph for stopping a session.
pub const STOP_EMOJI: &str = "\u{23F9}";

/// Who may interact with a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AllowedUsers {
    /// Only the invoking user.
    #[default]
    Author,
    /// Exactly these users.
    Only(HashSet<UserId>),
    /// Anyone except the bot itself.
    Everyone,
}

impl AllowedUsers {
    /// Allow a fixed set of users.
    pub fn only(users: impl IntoIterator<Item = UserId>) -> Self {
        Self::Only(users.into_iter().collect())
    }

    /// Check if `user` may interact with a session invoked by `author`.
    #[must_use]
    pub fn permits(&self, author: UserId, user: UserId) -> bool {
        match self {
            Self::Author => user == author,
            Self::Only(users) => users.contains(&user),
            Self::Everyone => true,
        }
    }
}

/// Configuration for a session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Inactivity window. `None` waits forever.
    pub timeout: Option<Duration>,
    /// What happens to the message after the session ends.
    pub disposition: Disposition,
    /// Who may interact.
    pub allowed_users: AllowedUsers,
    /// Clear every reaction during cleanup instead of only the bot's own.
    pub clear_reactions: bool,
}

impl SessionConfig {
    /// Create a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inactivity window.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wait forever between events.
    #[must_use]
    pub const fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the message disposition.
    #[must_use]
    pub fn disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = disposition;
        self
    }

    /// Delete the message when the session ends.
    #[must_use]
    pub fn delete_after(self) -> Self {
        self.disposition(Disposition::Delete)
    }

    /// Set who may interact.
    #[must_use]
    pub fn allowed_users(mut self, allowed: AllowedUsers) -> Self {
        self.allowed_users = allowed;
        self
    }

    /// Let anyone interact.
    #[must_use]
    pub fn allow_everyone(self) -> Self {
        self.allowed_users(AllowedUsers::Everyone)
    }

    /// Clear all reactions on cleanup.
    #[must_use]
    pub const fn clear_reactions(mut self, clear: bool) -> Self {
        self.clear_reactions = clear;
        self
    }
}

/// Predicate applied to prompt replies.
pub type ReplyCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Options for [`prompt`](crate::prompt::prompt).
#[derive(Clone, Default)]
pub struct PromptOptions {
    /// How long to wait for a reply. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Fail with a timeout error instead of returning the default.
    pub strict: bool,
    /// Returned when no reply arrives in time.
    pub default: Option<String>,
    /// Delete the question once it is answered or abandoned.
    pub delete_after: bool,
    /// Replies that fail this check are ignored.
    pub check: Option<ReplyCheck>,
}

impl PromptOptions {
    /// Create options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reply timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fail on timeout.
    #[must_use]
    pub const fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Set the value returned on timeout.
    #[must_use]
    pub fn default_answer(mut self, answer: impl Into<String>) -> Self {
        self.default = Some(answer.into());
        self
    }

    /// Delete the question afterwards.
    #[must_use]
    pub const fn delete_after(mut self) -> Self {
        self.delete_after = true;
        self
    }

    /// Only accept replies passing `check`.
    #[must_use]
    pub fn check(mut self, check: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.check = Some(Arc::new(check));
        self
    }

    /// Check a reply against the configured filter.
    #[must_use]
    pub fn accepts(&self, reply: &str) -> bool {
        self.check.as_ref().is_none_or(|check| check(reply))
    }
}

impl fmt::Debug for PromptOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptOptions")
            .field("timeout", &self.timeout)
            .field("strict", &self.strict)
            .field("default", &self.default)
            .field("delete_after", &self.delete_after)
            .field("check", &self.check.is_some())
            .finish()
    }
}

/// Glyphs of the paginator's navigation buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatorButtons {
    /// Jump to the first page.
    pub first: Emoji,
    /// Previous page.
    pub previous: Emoji,
    /// Next page.
    pub next: Emoji,
    /// Jump to the last known page.
    pub last: Emoji,
    /// End the session.
    pub stop: Emoji,
}

impl Default for PaginatorButtons {
    fn default() -> Self {
        Self {
            first: Emoji::unicode(FIRST_EMOJI),
            previous: Emoji::unicode(PREVIOUS_EMOJI),
            next: Emoji::unicode(NEXT_EMOJI),
            last: Emoji::unicode(LAST_EMOJI),
            stop: Emoji::unicode(STOP_EMOJI),
        }
    }
}

impl PaginatorButtons {
    /// Check if these are the stock glyphs.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_users_defaults_to_author() {
        let allowed = AllowedUsers::default();
        assert!(allowed.permits(UserId(1), UserId(1)));
        assert!(!allowed.permits(UserId(1), UserId(2)));
    }

    #[test]
    fn explicit_set_excludes_author() {
        let allowed = AllowedUsers::only([UserId(2), UserId(3)]);
        assert!(allowed.permits(UserId(1), UserId(3)));
        assert!(!allowed.permits(UserId(1), UserId(1)));
        assert!(AllowedUsers::Everyone.permits(UserId(1), UserId(9)));
    }

    #[test]
    fn session_config_builder() {
        let config = SessionConfig::new()
            .timeout(Duration::from_secs(30))
            .delete_after()
            .allow_everyone()
            .clear_reactions(true);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.disposition, Disposition::Delete);
        assert_eq!(config.allowed_users, AllowedUsers::Everyone);
        assert!(config.clear_reactions);
        assert!(config.no_timeout().timeout.is_none());
    }

    #[test]
    fn prompt_check() {
        let options = PromptOptions::new().check(|reply| !reply.trim().is_empty());
        assert!(options.accepts("42"));
        assert!(!options.accepts("   "));
        assert!(PromptOptions::new().accepts(""));
    }

    #[test]
    fn paginator_buttons_default() {
        let buttons = PaginatorButtons::default();
        assert!(buttons.is_default());
        assert_eq!(buttons.next, Emoji::unicode("\u{25B6}"));
    }
}
