//! chat-interact-macros: Procedural macros for chat-interact
//!
//! This crate provides [`actions!`], a declarative way to build an action registry whose
//! triggers are checked while the crate compiles:
//!
//! - text command patterns must be valid regexes,
//! - the same trigger may not be declared twice.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::LazyLock;
//! use chat_interact::{ActionRegistry, actions};
//!
//! #[derive(Debug, Clone, Copy)]
//! enum Nav { Back, Forward, Jump, Close }
//!
//! static NAV: LazyLock<ActionRegistry<Nav>> = LazyLock::new(|| actions! {
//!     button("\u{25C0}") => Nav::Back,
//!     button("\u{25B6}") => Nav::Forward,
//!     command(r"go (\d+)") => Nav::Jump,
//!     release("<:close:1234>") => Nav::Close,
//! });
//! ```

// In proc-macro crates, passing parsed input by value is idiomatic
#![allow(clippy::needless_pass_by_value)]

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod actions;

/// Declare an action registry.
///
/// Expands to an expression of type `chat_interact::ActionRegistry<A>`.
///
/// # Syntax
///
/// ```ignore
/// actions! {
///     extends PARENT_REGISTRY;          // optional, must come first
///     button("emoji") => action,        // fires when the reaction is added
///     button(123456789) => action,      // custom emoji by id
///     release("emoji") => action,       // fires when the reaction is removed
///     command(r"regex") => action,      // whole-message text match
/// }
/// ```
///
/// Custom emoji may be written as `"<:name:id>"`, `"<a:name:id>"` or a bare integer id; all
/// three forms name the same button.
///
/// An entry that re-declares a trigger of the parent registry overrides it in place.
#[proc_macro]
pub fn actions(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as actions::ActionsInput);
    actions::expand(input).into()
}
