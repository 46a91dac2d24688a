//! File-based configuration loading.
//!
//! ```toml
//! [session]
//! timeout_secs = 120
//! delete_after = false
//! clear_reactions = true
//!
//! [prompt]
//! timeout_secs = 60
//! strict = true
//!
//! [paginator]
//! previous = "<:left:1234>"
//! next = "<:right:1235>"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::env::{EnvConfig, vars};
use super::{AllowedUsers, PaginatorButtons, PromptOptions, SessionConfig};
use crate::error::{InteractError, Result};
use crate::session::Disposition;
use crate::types::Emoji;

/// Session defaults as written in a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSection {
    /// Inactivity timeout in seconds. Absent or `0` waits forever.
    pub timeout_secs: Option<u64>,
    /// Delete the message when the session ends.
    pub delete_after: bool,
    /// Clear all reactions on cleanup.
    pub clear_reactions: bool,
    /// Let anyone interact, not just the invoking user.
    pub allow_everyone: bool,
}

/// Prompt defaults as written in a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromptSection {
    /// Reply timeout in seconds. Absent or `0` waits forever.
    pub timeout_secs: Option<u64>,
    /// Fail on timeout.
    pub strict: bool,
    /// Delete the question afterwards.
    pub delete_after: bool,
}

/// Paginator glyph overrides. Each is a unicode glyph or `<:name:id>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginatorSection {
    /// First-page glyph.
    pub first: Option<String>,
    /// Previous-page glyph.
    pub previous: Option<String>,
    /// Next-page glyph.
    pub next: Option<String>,
    /// Last-page glyph.
    pub last: Option<String>,
    /// Stop glyph.
    pub stop: Option<String>,
}

/// Settings loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractConfig {
    /// `[session]`
    pub session: SessionSection,
    /// `[prompt]`
    pub prompt: PromptSection,
    /// `[paginator]`
    pub paginator: PaginatorSection,
}

fn secs(value: Option<u64>) -> Option<Duration> {
    value.filter(|&s| s > 0).map(Duration::from_secs)
}

impl InteractConfig {
    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| InteractError::config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| InteractError::config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded interaction config");
        Ok(config)
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| InteractError::config(e.to_string()))
    }

    /// Apply `CHAT_INTERACT_*` overrides on top of the file values.
    #[must_use]
    pub fn apply_env(mut self, env: &EnvConfig) -> Self {
        if let Some(timeout) = env.timeout_secs(vars::TIMEOUT) {
            self.session.timeout_secs = timeout.map(|d| d.as_secs());
        }
        if let Some(delete) = env.bool(vars::DELETE_AFTER) {
            self.session.delete_after = delete;
        }
        if let Some(clear) = env.bool(vars::CLEAR_REACTIONS) {
            self.session.clear_reactions = clear;
        }
        if let Some(timeout) = env.timeout_secs(vars::PROMPT_TIMEOUT) {
            self.prompt.timeout_secs = timeout.map(|d| d.as_secs());
        }
        if let Some(strict) = env.bool(vars::PROMPT_STRICT) {
            self.prompt.strict = strict;
        }
        self
    }

    /// Build a session config from these settings.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            timeout: secs(self.session.timeout_secs),
            disposition: if self.session.delete_after {
                Disposition::Delete
            } else {
                Disposition::Keep
            },
            allowed_users: if self.session.allow_everyone {
                AllowedUsers::Everyone
            } else {
                AllowedUsers::Author
            },
            clear_reactions: self.session.clear_reactions,
        }
    }

    /// Build prompt options from these settings.
    #[must_use]
    pub fn prompt_options(&self) -> PromptOptions {
        PromptOptions {
            timeout: secs(self.prompt.timeout_secs),
            strict: self.prompt.strict,
            delete_after: self.prompt.delete_after,
            ..PromptOptions::default()
        }
    }

    /// Build paginator buttons, falling back to the stock glyphs.
    #[must_use]
    pub fn paginator_buttons(&self) -> PaginatorButtons {
        let defaults = PaginatorButtons::default();
        let pick = |glyph: &Option<String>, fallback: Emoji| {
            glyph.as_deref().map_or(fallback, Emoji::parse)
        };
        PaginatorButtons {
            first: pick(&self.paginator.first, defaults.first),
            previous: pick(&self.paginator.previous, defaults.previous),
            next: pick(&self.paginator.next, defaults.next),
            last: pick(&self.paginator.last, defaults.last),
            stop: pick(&self.paginator.stop, defaults.stop),
        }
    }
}
