//! Trigger-to-action registration.
//!
//! An [`ActionRegistry`] maps triggers (reaction buttons and text commands) to action values.
//! Interactions declare one registry per type, usually as a `LazyLock` built with the
//! [`actions!`](crate::actions) macro, and resolve incoming events against it.
//!
//! # Resolution rules
//!
//! - Reaction events match a button by exact emoji equality. Buttons fire on press unless
//!   declared as release buttons.
//! - Text events are matched against command patterns in declaration order. A pattern must match
//!   the whole message; the first match wins.
//! - An extending registry starts from its parent's entries. Re-declaring a parent trigger
//!   replaces the parent's action and keeps the parent's position.

use std::fmt;

use regex::Regex;

use crate::error::{InteractError, Result};
use crate::types::{Emoji, Event, MessageEvent, ReactionEvent, UserId};

/// Which side of a reaction a button responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonPhase {
    /// The reaction was added.
    #[default]
    Press,
    /// The reaction was removed.
    Release,
}

/// A compiled text command pattern.
///
/// Patterns always match the entire message: `next` matches `"next"` but not `"next page"`.
#[derive(Clone)]
pub struct TextPattern {
    source: String,
    case_insensitive: bool,
    regex: Regex,
}

impl TextPattern {
    /// Compile a case-sensitive pattern.
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::InvalidPattern`] if the pattern is not a valid regex.
    pub fn new(pattern: &str) -> Result<Self> {
        Self::compile(pattern, false)
    }

    /// Compile a pattern that ignores case.
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::InvalidPattern`] if the pattern is not a valid regex.
    pub fn case_insensitive(pattern: &str) -> Result<Self> {
        Self::compile(pattern, true)
    }

    /// A pattern matching `text` literally, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::InvalidPattern`] if the escaped text exceeds the regex size
    /// limit.
    pub fn literal(text: &str) -> Result<Self> {
        Self::compile(&regex::escape(text), true)
    }

    fn compile(pattern: &str, case_insensitive: bool) -> Result<Self> {
        let regex = Regex::new(&anchored(pattern, case_insensitive)).map_err(|source| {
            InteractError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(Self {
            source: pattern.to_string(),
            case_insensitive,
            regex,
        })
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check if the whole of `text` matches.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Match the whole of `text` and return capture groups 1 and up.
    ///
    /// Groups that did not participate in the match are returned as empty strings.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(text)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        )
    }
}

/// Wrap a pattern so it only matches whole messages.
fn anchored(pattern: &str, case_insensitive: bool) -> String {
    let flags = if case_insensitive { "(?i)" } else { "" };
    format!("{flags}^(?:{pattern})$")
}

impl PartialEq for TextPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.case_insensitive == other.case_insensitive
    }
}

impl Eq for TextPattern {}

impl fmt::Debug for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextPattern")
            .field("source", &self.source)
            .field("case_insensitive", &self.case_insensitive)
            .finish()
    }
}

/// What makes an action fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A reaction button.
    Reaction {
        /// The emoji.
        emoji: Emoji,
        /// Press or release.
        phase: ButtonPhase,
    },
    /// A text command.
    Text(TextPattern),
}

impl Trigger {
    /// A button that fires when pressed.
    pub fn button(emoji: impl Into<Emoji>) -> Self {
        Self::Reaction {
            emoji: emoji.into(),
            phase: ButtonPhase::Press,
        }
    }

    /// A button that fires when released.
    pub fn release(emoji: impl Into<Emoji>) -> Self {
        Self::Reaction {
            emoji: emoji.into(),
            phase: ButtonPhase::Release,
        }
    }

    /// A text command.
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::InvalidPattern`] if the pattern does not compile.
    pub fn command(pattern: &str) -> Result<Self> {
        TextPattern::new(pattern).map(Self::Text)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reaction {
                emoji,
                phase: ButtonPhase::Press,
            } => write!(f, "button {emoji}"),
            Self::Reaction {
                emoji,
                phase: ButtonPhase::Release,
            } => write!(f, "release {emoji}"),
            Self::Text(pattern) => write!(f, "command /{}/", pattern.as_str()),
        }
    }
}

/// The event payload passed to an action handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEvent {
    /// A button was pressed or released.
    Reaction {
        /// The raw reaction event.
        event: ReactionEvent,
        /// `true` for a press, `false` for a release.
        pressed: bool,
    },
    /// A text command matched.
    Text {
        /// The message that matched.
        message: MessageEvent,
        /// Capture groups 1 and up.
        captures: Vec<String>,
    },
}

impl ActionEvent {
    /// The user who triggered the action.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        match self {
            Self::Reaction { event, .. } => event.user_id,
            Self::Text { message, .. } => message.author_id,
        }
    }

    /// Get a capture group of a text command (0 is the first group).
    #[must_use]
    pub fn capture(&self, index: usize) -> Option<&str> {
        match self {
            Self::Text { captures, .. } => captures.get(index).map(String::as_str),
            Self::Reaction { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<A> {
    trigger: Trigger,
    action: A,
}

/// An ordered trigger table.
#[derive(Debug, Clone)]
pub struct ActionRegistry<A> {
    entries: Vec<Entry<A>>,
}

impl<A> Default for ActionRegistry<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<A: Copy> ActionRegistry<A> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a registry.
    #[must_use]
    pub fn builder() -> ActionRegistryBuilder<A> {
        ActionRegistryBuilder::new()
    }

    /// Number of registered triggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve an event to an action and its handler payload.
    #[must_use]
    pub fn resolve(&self, event: &Event) -> Option<(A, ActionEvent)> {
        match event {
            Event::ReactionAdded(reaction) => self
                .resolve_reaction(&reaction.emoji, ButtonPhase::Press)
                .map(|action| {
                    let event = ActionEvent::Reaction {
                        event: reaction.clone(),
                        pressed: true,
                    };
                    (action, event)
                }),
            Event::ReactionRemoved(reaction) => self
                .resolve_reaction(&reaction.emoji, ButtonPhase::Release)
                .map(|action| {
                    let event = ActionEvent::Reaction {
                        event: reaction.clone(),
                        pressed: false,
                    };
                    (action, event)
                }),
            Event::MessageCreated(message) => {
                self.resolve_text(&message.content).map(|(action, captures)| {
                    let event = ActionEvent::Text {
                        message: message.clone(),
                        captures,
                    };
                    (action, event)
                })
            }
            Event::MessageDeleted { .. } => None,
        }
    }

    /// Find the action bound to a reaction button.
    #[must_use]
    pub fn resolve_reaction(&self, emoji: &Emoji, phase: ButtonPhase) -> Option<A> {
        self.entries.iter().find_map(|entry| match &entry.trigger {
            Trigger::Reaction { emoji: e, phase: p } if e == emoji && *p == phase => {
                Some(entry.action)
            }
            _ => None,
        })
    }

    /// Find the first command whose pattern matches the whole of `text`.
    #[must_use]
    pub fn resolve_text(&self, text: &str) -> Option<(A, Vec<String>)> {
        self.entries.iter().find_map(|entry| match &entry.trigger {
            Trigger::Text(pattern) => pattern.captures(text).map(|caps| (entry.action, caps)),
            Trigger::Reaction { .. } => None,
        })
    }

    /// Every action whose command pattern matches the whole of `text`, in declaration order.
    pub fn matching_commands<'a>(&'a self, text: &'a str) -> impl Iterator<Item = A> + 'a {
        self.entries.iter().filter_map(move |entry| match &entry.trigger {
            Trigger::Text(pattern) if pattern.is_match(text) => Some(entry.action),
            _ => None,
        })
    }

    /// Press buttons in declaration order; these are the reactions a session attaches.
    pub fn buttons(&self) -> impl Iterator<Item = &Emoji> {
        self.entries.iter().filter_map(|entry| match &entry.trigger {
            Trigger::Reaction {
                emoji,
                phase: ButtonPhase::Press,
            } => Some(emoji),
            _ => None,
        })
    }

    /// Every registered trigger with its action, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Trigger, A)> {
        self.entries.iter().map(|entry| (&entry.trigger, entry.action))
    }

    /// Check if any text commands are registered.
    #[must_use]
    pub fn has_commands(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(entry.trigger, Trigger::Text(_)))
    }

    /// Register a trigger, replacing an existing binding in place.
    pub fn insert(&mut self, trigger: Trigger, action: A) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.trigger == trigger) {
            entry.action = action;
        } else {
            self.entries.push(Entry { trigger, action });
        }
    }

    /// Remove a trigger. Returns `true` if it was registered.
    pub fn remove(&mut self, trigger: &Trigger) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.trigger != trigger);
        self.entries.len() != before
    }

    /// Add or rebind a press button.
    pub fn add_button(&mut self, emoji: impl Into<Emoji>, action: A) {
        self.insert(Trigger::button(emoji), action);
    }

    /// Add or rebind a button that fires when the reaction is removed.
    pub fn add_release(&mut self, emoji: impl Into<Emoji>, action: A) {
        self.insert(Trigger::release(emoji), action);
    }

    /// Remove every binding of a button, press and release alike. Returns `true` if any was
    /// registered.
    pub fn remove_button(&mut self, emoji: impl Into<Emoji>) -> bool {
        let emoji = emoji.into();
        let before = self.entries.len();
        self.entries.retain(|e| match &e.trigger {
            Trigger::Reaction { emoji: bound, .. } => bound != &emoji,
            Trigger::Text(_) => true,
        });
        self.entries.len() != before
    }

    /// Add or rebind a text command.
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::InvalidPattern`] if the pattern does not compile.
    pub fn add_command(&mut self, pattern: &str, action: A) -> Result<()> {
        self.insert(Trigger::command(pattern)?, action);
        Ok(())
    }

    /// Remove a case-sensitive text command by its source pattern.
    pub fn remove_command(&mut self, pattern: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| match &e.trigger {
            Trigger::Text(p) => p.as_str() != pattern || p.case_insensitive,
            Trigger::Reaction { .. } => true,
        });
        self.entries.len() != before
    }
}

enum Pending {
    Ready(Trigger),
    Command(String),
}

/// Builder for [`ActionRegistry`].
///
/// Patterns are compiled in [`build`](Self::build).
pub struct ActionRegistryBuilder<A> {
    base: Vec<Entry<A>>,
    pending: Vec<(Pending, A)>,
}

impl<A: Copy> ActionRegistryBuilder<A> {
    /// Create an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Start from a parent registry's entries.
    #[must_use]
    pub fn extends(mut self, parent: &ActionRegistry<A>) -> Self {
        self.base.clone_from(&parent.entries);
        self
    }

    /// Add a press button.
    #[must_use]
    pub fn button(mut self, emoji: impl Into<Emoji>, action: A) -> Self {
        self.pending
            .push((Pending::Ready(Trigger::button(emoji)), action));
        self
    }

    /// Add a release button.
    #[must_use]
    pub fn release(mut self, emoji: impl Into<Emoji>, action: A) -> Self {
        self.pending
            .push((Pending::Ready(Trigger::release(emoji)), action));
        self
    }

    /// Add a text command.
    #[must_use]
    pub fn command(mut self, pattern: impl Into<String>, action: A) -> Self {
        self.pending.push((Pending::Command(pattern.into()), action));
        self
    }

    /// Add a prebuilt trigger.
    #[must_use]
    pub fn trigger(mut self, trigger: Trigger, action: A) -> Self {
        self.pending.push((Pending::Ready(trigger), action));
        self
    }

    /// Compile patterns and assemble the registry.
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::InvalidPattern`] for a pattern that does not compile, and
    /// [`InteractError::InvalidArgument`] if the same trigger is declared twice (re-declaring a
    /// parent's trigger is an override, not a duplicate).
    pub fn build(self) -> Result<ActionRegistry<A>> {
        let inherited = self.base.len();
        let mut registry = ActionRegistry {
            entries: self.base,
        };
        let mut declared: Vec<Trigger> = Vec::with_capacity(self.pending.len());

        for (pending, action) in self.pending {
            let trigger = match pending {
                Pending::Ready(trigger) => trigger,
                Pending::Command(pattern) => Trigger::command(&pattern)?,
            };
            if declared.contains(&trigger) {
                return Err(InteractError::invalid_argument(format!(
                    "{trigger} is declared more than once"
                )));
            }
            declared.push(trigger.clone());
            registry.insert(trigger, action);
        }

        tracing::trace!(
            inherited,
            total = registry.len(),
            "built action registry"
        );
        Ok(registry)
    }
}

impl<A: Copy> Default for ActionRegistryBuilder<A> {
    fn default() -> Self {
        Self::new()
    }
}
