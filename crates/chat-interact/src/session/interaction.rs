//! The capability set a session is built from.

use std::fmt::Debug;
use std::future::Future;

use super::SessionContext;
use crate::action::{ActionEvent, ActionRegistry};
use crate::error::Result;
use crate::gateway::Gateway;
use crate::types::Content;

/// Behavior plugged into a [`Session`](super::Session).
///
/// The session owns the message, the subscription and the timeout; an interaction supplies the
/// initial content, the trigger table and what each action does.
///
/// # Example
///
/// ```ignore
/// use std::sync::LazyLock;
/// use chat_interact::prelude::*;
///
/// #[derive(Debug, Clone, Copy)]
/// enum Counter { Up, Done }
///
/// static ACTIONS: LazyLock<ActionRegistry<Counter>> = LazyLock::new(|| actions! {
///     button("\u{2B06}") => Counter::Up,
///     button("\u{2705}") => Counter::Done,
/// });
///
/// struct Clicker { count: u32 }
///
/// impl Interaction for Clicker {
///     type Action = Counter;
///
///     fn actions(&self) -> &ActionRegistry<Counter> {
///         &ACTIONS
///     }
///
///     async fn render_initial(&mut self) -> Result<Content> {
///         Ok(Content::text("0"))
///     }
///
///     async fn handle<G: Gateway>(
///         &mut self,
///         action: Counter,
///         _event: ActionEvent,
///         cx: &SessionContext<'_, G>,
///     ) -> Result<()> {
///         match action {
///             Counter::Up => {
///                 self.count += 1;
///                 cx.edit(&Content::text(self.count.to_string())).await
///             }
///             Counter::Done => {
///                 cx.stop();
///                 Ok(())
///             }
///         }
///     }
/// }
/// ```
pub trait Interaction: Send {
    /// The action values this interaction's triggers resolve to.
    type Action: Copy + Debug + Send + Sync + 'static;

    /// The trigger table. Consulted for every event, so it may change between events.
    fn actions(&self) -> &ActionRegistry<Self::Action>;

    /// Produce the first message. Errors abort the session before anything is sent.
    fn render_initial(&mut self) -> impl Future<Output = Result<Content>> + Send;

    /// Run the action a trigger resolved to.
    fn handle<G: Gateway>(
        &mut self,
        action: Self::Action,
        event: ActionEvent,
        cx: &SessionContext<'_, G>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Called when the inactivity window elapses, before cleanup.
    fn on_timeout<G: Gateway>(
        &mut self,
        cx: &SessionContext<'_, G>,
    ) -> impl Future<Output = Result<()>> + Send {
        let _ = cx;
        async { Ok(()) }
    }
}
