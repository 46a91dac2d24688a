//! chat-interact: Interactive sessions for chat bots
//!
//! This crate lets a bot collect structured input from a person through a single message:
//! free-text prompts, multiple-choice selections and paginated browsing. All of them run on
//! one session engine that owns the message, listens for the reactions and replies that
//! concern it, dispatches them to declared actions and always cleans up when it ends.
//!
//! # Features
//!
//! - **Async-first design** on the Tokio runtime
//! - **Declarative triggers** with the compile-time checked [`actions!`] macro
//! - **Reaction and text input** with capture groups for text commands
//! - **Sliding inactivity timeouts**, explicit stops and message deletion all end a session
//! - **Lazy page sources** over iterators and async streams
//! - **Mock gateway** for testing (feature: `mock`)
//!
//! The chat platform itself stays outside: implement [`Gateway`] for your client.
//!
//! # Example
//!
//! ```ignore
//! use chat_interact::prelude::*;
//!
//! async fn pick_color<G: Gateway>(gateway: &G, ctx: &InvocationContext) -> Result<()> {
//!     let choices = [
//!         Choice::new("red").button("\u{1F534}"),
//!         Choice::new("blue").button("\u{1F535}"),
//!     ];
//!     match select(gateway, ctx, "Pick a color", choices, SelectMode::Auto).await? {
//!         Some(color) => println!("picked {color}"),
//!         None => println!("cancelled"),
//!     }
//!     Ok(())
//! }
//! ```

// `actions!` expands to paths rooted at `::chat_interact`.
extern crate self as chat_interact;

// Re-export macros
pub use chat_interact_macros::actions;

// Core types
pub mod config;
pub mod error;
pub mod prelude;
pub mod types;

// Engine
pub mod action;
pub mod gateway;
pub mod session;
pub mod util;
pub mod waiter;

// Interactions
pub mod paginator;
pub mod prompt;
pub mod select;

/// Mock gateway for testing.
#[cfg(feature = "mock")]
pub mod mock;

pub use action::{
    ActionEvent, ActionRegistry, ActionRegistryBuilder, ButtonPhase, TextPattern, Trigger,
};
pub use config::{AllowedUsers, EnvConfig, InteractConfig, PaginatorButtons, PromptOptions, SessionConfig};
pub use error::{InteractError, Result, TransportError};
pub use gateway::{EventHub, EventKinds, Gateway, Subscription, SubscriptionId};
#[cfg(feature = "mock")]
pub use mock::{GatewayCall, MockGateway};
pub use paginator::{IterSource, PageInfo, PageSource, Paginator, PaginatorAction, StreamSource};
pub use prompt::prompt;
pub use select::{Choice, SelectMode, Selector, confirm, select};
pub use session::{
    Dispatch, Disposition, Interaction, LifecycleEvent, Session, SessionContext, StopHandle,
};
pub use types::{
    ChannelId, Content, Embed, Emoji, Event, GuildId, InvocationContext, MessageEvent,
    MessageHandle, MessageId, ReactionEvent, SessionId, SessionState, StopReason, UserId,
};
pub use util::{Deadline, InactivityTimer};
pub use waiter::{EventWaiter, Listener, WaitResult};
