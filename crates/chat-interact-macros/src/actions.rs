//! Action registry macro implementation.
//!
//! This module implements the `actions!` macro, which expands to a chain of
//! `ActionRegistryBuilder` calls after validating every trigger.

use std::collections::HashSet;

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Expr, Ident, Lit, LitInt, LitStr, Result, Token, braced};

/// Which trigger an entry declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// `button(..)`
    Button,
    /// `release(..)`
    Release,
    /// `command(..)`
    Command,
}

/// The emoji or pattern argument of an entry.
pub enum TriggerArg {
    /// A string literal.
    Str(LitStr),
    /// A custom emoji id.
    Id(LitInt),
}

impl TriggerArg {
    fn span(&self) -> Span {
        match self {
            Self::Str(lit) => lit.span(),
            Self::Id(lit) => lit.span(),
        }
    }
}

/// A single `kind(arg) => action` entry.
pub struct Entry {
    /// The trigger kind.
    pub kind: EntryKind,
    /// The emoji or pattern.
    pub arg: TriggerArg,
    /// The action expression.
    pub action: Expr,
}

impl Parse for Entry {
    fn parse(input: ParseStream) -> Result<Self> {
        let name: Ident = input.parse()?;
        let kind = match name.to_string().as_str() {
            "button" => EntryKind::Button,
            "release" => EntryKind::Release,
            "command" => EntryKind::Command,
            _ => {
                return Err(syn::Error::new(
                    name.span(),
                    format!("unknown trigger kind: {name} (expected button, release or command)"),
                ));
            }
        };

        let content;
        syn::parenthesized!(content in input);
        let arg = match content.parse::<Lit>()? {
            Lit::Str(lit) => TriggerArg::Str(lit),
            Lit::Int(lit) if kind != EntryKind::Command => TriggerArg::Id(lit),
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "expected a string literal or a custom emoji id",
                ));
            }
        };

        let _: Token![=>] = input.parse()?;
        let action: Expr = input.parse()?;

        Ok(Self { kind, arg, action })
    }
}

/// The actions! macro input.
pub struct ActionsInput {
    /// Optional parent registry.
    pub extends: Option<Expr>,
    /// The entries in declaration order.
    pub entries: Punctuated<Entry, Token![,]>,
}

impl ActionsInput {
    fn parse_body(input: ParseStream) -> Result<Self> {
        let extends = if input.peek(Ident) && input.fork().parse::<Ident>()? == "extends" {
            let _: Ident = input.parse()?;
            let parent: Expr = input.parse()?;
            let _: Token![;] = input.parse()?;
            Some(parent)
        } else {
            None
        };

        Ok(Self {
            extends,
            entries: Punctuated::parse_terminated(input)?,
        })
    }
}

impl Parse for ActionsInput {
    fn parse(input: ParseStream) -> Result<Self> {
        if input.peek(syn::token::Brace) {
            let content;
            braced!(content in input);
            Self::parse_body(&content)
        } else {
            Self::parse_body(input)
        }
    }
}

/// Normalize an emoji argument so different spellings of one custom emoji compare equal.
fn emoji_key(arg: &TriggerArg) -> Result<String> {
    match arg {
        TriggerArg::Id(lit) => Ok(format!("id:{}", lit.base10_parse::<u64>()?)),
        TriggerArg::Str(lit) => {
            let text = lit.value();
            if text.is_empty() {
                return Err(syn::Error::new(lit.span(), "emoji must not be empty"));
            }
            Ok(custom_emoji_id(&text).map_or(text, |id| format!("id:{id}")))
        }
    }
}

fn custom_emoji_id(text: &str) -> Option<u64> {
    let inner = text.strip_prefix('<')?.strip_suffix('>')?;
    let rest = inner
        .strip_prefix("a:")
        .or_else(|| inner.strip_prefix(':'))?;
    let (name, id) = rest.rsplit_once(':')?;
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    id.parse().ok()
}

/// Check one entry and produce its builder call.
fn expand_entry(entry: &Entry, seen: &mut HashSet<(EntryKind, String)>) -> Result<TokenStream> {
    let key = match (&entry.kind, &entry.arg) {
        (EntryKind::Command, TriggerArg::Str(lit)) => {
            let pattern = lit.value();
            if let Err(e) = regex::Regex::new(&format!("^(?:{pattern})$")) {
                return Err(syn::Error::new(lit.span(), format!("invalid regex: {e}")));
            }
            pattern
        }
        (EntryKind::Command, TriggerArg::Id(lit)) => {
            return Err(syn::Error::new(lit.span(), "command expects a pattern string"));
        }
        (_, arg) => emoji_key(arg)?,
    };

    if !seen.insert((entry.kind, key)) {
        return Err(syn::Error::new(
            entry.arg.span(),
            "this trigger is already declared in this registry",
        ));
    }

    let action = &entry.action;
    let arg = match &entry.arg {
        TriggerArg::Str(lit) => quote! { #lit },
        TriggerArg::Id(lit) => quote! { ::chat_interact::Emoji::custom(#lit) },
    };

    Ok(match entry.kind {
        EntryKind::Button => quote! { .button(#arg, #action) },
        EntryKind::Release => quote! { .release(#arg, #action) },
        EntryKind::Command => quote! { .command(#arg, #action) },
    })
}

/// Generate code for the actions! macro.
pub fn expand(input: ActionsInput) -> TokenStream {
    let mut seen = HashSet::new();
    let mut calls = Vec::with_capacity(input.entries.len());
    for entry in &input.entries {
        match expand_entry(entry, &mut seen) {
            Ok(call) => calls.push(call),
            Err(e) => return e.to_compile_error(),
        }
    }

    let extends = input
        .extends
        .map(|parent| quote! { .extends(&#parent) });

    quote! {
        ::chat_interact::ActionRegistry::builder()
            #extends
            #(#calls)*
            .build()
            .expect("actions! triggers were validated at compile time")
    }
}
