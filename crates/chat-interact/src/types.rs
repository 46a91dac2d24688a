//! Common types for chat-interact.
//!
//! This module defines the platform-facing value types the engine works with: identifiers,
//! emoji, message content, gateway events and session state.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Get the inner value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// Identifier of a platform user (or bot).
    UserId
);
snowflake!(
    /// Identifier of a text channel.
    ChannelId
);
snowflake!(
    /// Identifier of a guild (server).
    GuildId
);
snowflake!(
    /// Identifier of a message.
    MessageId
);

/// Reference to a message sent through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    /// The message id.
    pub id: MessageId,
    /// The channel the message lives in.
    pub channel_id: ChannelId,
}

impl MessageHandle {
    /// Create a new message handle.
    #[must_use]
    pub const fn new(id: MessageId, channel_id: ChannelId) -> Self {
        Self { id, channel_id }
    }
}

/// The user, channel and guild a session was invoked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationContext {
    /// The user who invoked the command.
    pub author: UserId,
    /// The channel the command was invoked in.
    pub channel: ChannelId,
    /// The guild, if the channel belongs to one.
    pub guild: Option<GuildId>,
}

impl InvocationContext {
    /// Create a context for a direct-message channel.
    #[must_use]
    pub const fn new(author: UserId, channel: ChannelId) -> Self {
        Self {
            author,
            channel,
            guild: None,
        }
    }

    /// Set the guild.
    #[must_use]
    pub const fn in_guild(mut self, guild: GuildId) -> Self {
        self.guild = Some(guild);
        self
    }
}

/// An emoji used as a reaction.
///
/// Custom platform emoji compare by id only, so `<:ok:42>` and `<a:renamed:42>` are the same
/// emoji. Unicode emoji compare by exact code points.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub enum Emoji {
    /// A unicode emoji such as `"\u{25B6}"`.
    Unicode(String),
    /// A custom emoji uploaded to the platform.
    Custom {
        /// The emoji id.
        id: u64,
        /// The emoji name, if known.
        name: Option<String>,
        /// Whether the emoji is animated.
        animated: bool,
    },
}

impl Emoji {
    /// Create a unicode emoji.
    pub fn unicode(glyph: impl Into<String>) -> Self {
        Self::Unicode(glyph.into())
    }

    /// Create a custom emoji from its id.
    #[must_use]
    pub const fn custom(id: u64) -> Self {
        Self::Custom {
            id,
            name: None,
            animated: false,
        }
    }

    /// Parse an emoji from its textual form.
    ///
    /// `<:name:id>` and `<a:name:id>` become custom emoji; anything else is taken as a unicode
    /// glyph.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        parse_custom(text).unwrap_or_else(|| Self::Unicode(text.to_string()))
    }

    /// Check if this is a custom emoji.
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom { .. })
    }
}

fn parse_custom(text: &str) -> Option<Emoji> {
    let inner = text.strip_prefix('<')?.strip_suffix('>')?;
    let (animated, rest) = match inner.strip_prefix("a:") {
        Some(rest) => (true, rest),
        None => (false, inner.strip_prefix(':')?),
    };
    let (name, id) = rest.rsplit_once(':')?;
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    let id = id.parse().ok()?;
    Some(Emoji::Custom {
        id,
        name: Some(name.to_string()),
        animated,
    })
}

impl PartialEq for Emoji {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unicode(a), Self::Unicode(b)) => a == b,
            (Self::Custom { id: a, .. }, Self::Custom { id: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl std::hash::Hash for Emoji {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Self::Unicode(glyph) => glyph.hash(state),
            Self::Custom { id, .. } => id.hash(state),
        }
    }
}

impl fmt::Display for Emoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unicode(glyph) => f.write_str(glyph),
            Self::Custom { id, name, animated } => {
                let prefix = if *animated { "a" } else { "" };
                write!(f, "<{prefix}:{}:{id}>", name.as_deref().unwrap_or("_"))
            }
        }
    }
}

impl From<&str> for Emoji {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for Emoji {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<u64> for Emoji {
    fn from(id: u64) -> Self {
        Self::custom(id)
    }
}

/// A minimal embed. Rendering is left to the gateway implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Embed title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Embed body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Footer line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl Embed {
    /// Create an empty embed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the footer text.
    #[must_use]
    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// What a message displays: plain text, an embed, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// Plain text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Embed shown below the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
}

impl Content {
    /// Create text-only content.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            embed: None,
        }
    }

    /// Create embed-only content.
    #[must_use]
    pub const fn embed(embed: Embed) -> Self {
        Self {
            text: None,
            embed: Some(embed),
        }
    }

    /// Append a block of lines to the content.
    ///
    /// Goes into the embed description when there is an embed, otherwise into the text.
    #[must_use]
    pub fn append_block(mut self, block: &str) -> Self {
        fn join(existing: Option<String>, block: &str) -> String {
            match existing {
                Some(existing) if !existing.is_empty() => format!("{existing}\n{block}"),
                _ => block.to_string(),
            }
        }

        if let Some(embed) = self.embed.as_mut() {
            embed.description = Some(join(embed.description.take(), block));
        } else {
            self.text = Some(join(self.text.take(), block));
        }
        self
    }

    /// Check if there is nothing to display.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(str::is_empty) && self.embed.is_none()
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<Embed> for Content {
    fn from(embed: Embed) -> Self {
        Self::embed(embed)
    }
}

/// A reaction being added to or removed from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    /// The message the reaction is on.
    pub message_id: MessageId,
    /// The channel of that message.
    pub channel_id: ChannelId,
    /// The guild of that channel, if any.
    pub guild_id: Option<GuildId>,
    /// The user who reacted.
    pub user_id: UserId,
    /// The emoji used.
    pub emoji: Emoji,
}

/// A message posted in a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    /// The new message's id.
    pub id: MessageId,
    /// The channel it was posted in.
    pub channel_id: ChannelId,
    /// The guild of that channel, if any.
    pub guild_id: Option<GuildId>,
    /// The author.
    pub author_id: UserId,
    /// Text content.
    pub content: String,
}

/// An event delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A reaction was added to a message.
    ReactionAdded(ReactionEvent),
    /// A reaction was removed from a message.
    ReactionRemoved(ReactionEvent),
    /// A message was created.
    MessageCreated(MessageEvent),
    /// A message was deleted.
    MessageDeleted {
        /// The deleted message.
        id: MessageId,
        /// Its channel.
        channel_id: ChannelId,
    },
}

impl Event {
    /// Get the user who caused this event, if there is one.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::ReactionAdded(r) | Self::ReactionRemoved(r) => Some(r.user_id),
            Self::MessageCreated(m) => Some(m.author_id),
            Self::MessageDeleted { .. } => None,
        }
    }

    /// Get the channel this event happened in.
    #[must_use]
    pub const fn channel_id(&self) -> ChannelId {
        match self {
            Self::ReactionAdded(r) | Self::ReactionRemoved(r) => r.channel_id,
            Self::MessageCreated(m) => m.channel_id,
            Self::MessageDeleted { channel_id, .. } => *channel_id,
        }
    }
}

/// The state of a session.
///
/// States only ever advance: `Created → Starting → Running → Stopping → Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Constructed, not started.
    Created,
    /// Sending the initial message.
    Starting,
    /// Waiting for and dispatching events.
    Running,
    /// Cleaning up.
    Stopping,
    /// Finished. Terminal.
    Stopped,
}

impl SessionState {
    /// Check if the session is dispatching events.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if the session has finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A handler or a [`StopHandle`](crate::session::StopHandle) requested the stop.
    Stopped,
    /// No matching event arrived within the inactivity window.
    TimedOut,
    /// Someone deleted the session's message.
    MessageDeleted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stopped => "stopped",
            Self::TimedOut => "timed out",
            Self::MessageDeleted => "message deleted",
        };
        f.write_str(s)
    }
}

/// A unique session identifier, used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Create a new session ID.
    #[must_use]
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the inner value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}
