//! Convenient re-exports for common chat-interact usage.
//!
//! ```ignore
//! use chat_interact::prelude::*;
//! ```

// Macros (re-exported from chat-interact-macros)
pub use crate::actions;

// Error handling
pub use crate::error::{InteractError, Result, TransportError};

// Platform types
pub use crate::types::{
    ChannelId, Content, Embed, Emoji, Event, GuildId, InvocationContext, MessageHandle, MessageId,
    StopReason, UserId,
};

// Transport
pub use crate::gateway::{EventKinds, Gateway};
pub use crate::waiter::{EventWaiter, WaitResult};

// Sessions
pub use crate::action::{ActionEvent, ActionRegistry};
pub use crate::config::{AllowedUsers, PromptOptions, SessionConfig};
pub use crate::session::{Disposition, Interaction, Session, SessionContext, StopHandle};

// Ready-made interactions
pub use crate::paginator::{Paginator, PaginatorAction};
pub use crate::prompt::prompt;
pub use crate::select::{Choice, SelectMode, Selector, confirm, select};
