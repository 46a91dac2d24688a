//! Free-text prompts.
//!
//! [`prompt`] asks a question and waits for the invoking user to answer in the same channel.
//! Unlike a [`Session`](crate::session::Session), a prompt waits exactly once, against an
//! absolute deadline.

use tracing::Instrument;

use crate::config::PromptOptions;
use crate::error::{InteractError, Result};
use crate::gateway::{EventKinds, Gateway};
use crate::types::{Content, Event, InvocationContext};
use crate::waiter::{EventWaiter, WaitResult};

/// Ask a question and return the invoking user's reply.
///
/// Only messages by the invoking user in the invoking channel that pass
/// [`PromptOptions::check`] count as replies.
///
/// Returns `Ok(Some(reply))` when answered. When nobody answers in time this returns the
/// configured default (`Ok(None)` unless one was set), or fails with
/// [`InteractError::TimedOut`] in strict mode.
///
/// # Errors
///
/// - [`InteractError::Transport`] if the question cannot be sent.
/// - [`InteractError::TimedOut`] on timeout in strict mode.
/// - [`InteractError::ConnectionLost`] if the gateway drops the event stream.
///
/// # Example
///
/// ```ignore
/// let name = prompt(&gateway, &ctx, "What's your name?", PromptOptions::new()
///     .timeout(Duration::from_secs(60))
///     .check(|reply| !reply.trim().is_empty()))
/// .await?;
/// ```
pub async fn prompt<G: Gateway>(
    gateway: &G,
    invocation: &InvocationContext,
    question: impl Into<Content>,
    options: PromptOptions,
) -> Result<Option<String>> {
    let span = tracing::info_span!(
        "prompt",
        author = %invocation.author,
        channel = %invocation.channel,
    );
    ask(gateway, invocation, question.into(), options)
        .instrument(span)
        .await
}

async fn ask<G: Gateway>(
    gateway: &G,
    invocation: &InvocationContext,
    question: Content,
    options: PromptOptions,
) -> Result<Option<String>> {
    let message = gateway.send(invocation.channel, &question).await?;
    tracing::debug!(message_id = %message.id, timeout = ?options.timeout, "question sent");

    let author = invocation.author;
    let channel = invocation.channel;
    let filter = options.clone();
    let waited = EventWaiter::new(gateway)
        .wait_for(
            EventKinds::MESSAGE_CREATED,
            move |event| match event {
                Event::MessageCreated(reply) => {
                    reply.author_id == author
                        && reply.channel_id == channel
                        && filter.accepts(&reply.content)
                }
                _ => false,
            },
            options.timeout,
        )
        .await;

    if options.delete_after {
        if let Err(error) = gateway.delete(&message).await {
            tracing::warn!(%error, "failed to delete question");
        }
    }

    match waited? {
        WaitResult::Matched(Event::MessageCreated(reply)) => {
            tracing::debug!(reply_id = %reply.id, "answered");
            Ok(Some(reply.content))
        }
        WaitResult::Matched(_) => Ok(None),
        WaitResult::Timeout if options.strict => {
            Err(InteractError::timed_out(options.timeout, "a reply"))
        }
        WaitResult::Timeout => {
            tracing::debug!("no reply, using default");
            Ok(options.default)
        }
    }
}
