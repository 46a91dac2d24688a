//! Session management.
//!
//! This module provides the [`Session`] engine and the pieces an [`Interaction`] plugs into:
//! the [`SessionContext`] handed to action handlers, the [`StopHandle`] and the lifecycle
//! types.

mod context;
mod handle;
mod interaction;
mod lifecycle;

pub use context::{SessionContext, StopHandle};
pub use handle::{Dispatch, Session};
pub use interaction::Interaction;
pub use lifecycle::{Disposition, Lifecycle, LifecycleCallback, LifecycleEvent};
