//! Integration tests for the session engine.
//!
//! Sessions run against the in-memory gateway; each test drives the session on one branch of
//! `tokio::join!` and plays the user on the other.

#![cfg(feature = "mock")]

use std::sync::LazyLock;
use std::time::Duration;

use chat_interact::mock::{GatewayCall, MockGateway};
use chat_interact::prelude::*;
use chat_interact::{Dispatch, SessionState};
use tokio::time::Instant;

const ADD: &str = "\u{2795}";
const DONE: &str = "\u{2705}";

const AUTHOR: UserId = UserId(10);
const CHANNEL: ChannelId = ChannelId(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tally {
    Add,
    Undo,
    Set,
    Fail,
    Done,
}

static TALLY: LazyLock<ActionRegistry<Tally>> = LazyLock::new(|| {
    actions! {
        button("\u{2795}") => Tally::Add,
        release("\u{2795}") => Tally::Undo,
        command(r"set (\d+)") => Tally::Set,
        command("fail") => Tally::Fail,
        button("\u{2705}") => Tally::Done,
        command("done") => Tally::Done,
    }
});

#[derive(Debug, Default)]
struct Counter {
    count: u32,
    timeouts: u32,
}

impl Interaction for Counter {
    type Action = Tally;

    fn actions(&self) -> &ActionRegistry<Tally> {
        &TALLY
    }

    async fn render_initial(&mut self) -> Result<Content> {
        Ok(Content::text("0"))
    }

    async fn handle<G: Gateway>(
        &mut self,
        action: Tally,
        event: ActionEvent,
        cx: &SessionContext<'_, G>,
    ) -> Result<()> {
        match action {
            Tally::Add => self.count += 1,
            Tally::Undo => self.count = self.count.saturating_sub(1),
            Tally::Set => {
                self.count = event
                    .capture(0)
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(self.count);
            }
            Tally::Fail => return Err(InteractError::invalid_argument("boom")),
            Tally::Done => {
                cx.stop();
                return Ok(());
            }
        }
        cx.edit(&Content::text(self.count.to_string())).await
    }

    async fn on_timeout<G: Gateway>(&mut self, cx: &SessionContext<'_, G>) -> Result<()> {
        self.timeouts += 1;
        cx.edit(&Content::text("expired")).await
    }
}

fn invocation() -> InvocationContext {
    InvocationContext::new(AUTHOR, CHANNEL)
}

/// Route session logs to the test harness. Set `RUST_LOG=chat_interact=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn has_call(gateway: &MockGateway, pred: impl Fn(&GatewayCall) -> bool) -> bool {
    gateway.calls().iter().any(pred)
}

#[tokio::test]
async fn full_run_cleans_up() {
    init_tracing();
    let gateway = MockGateway::new();
    let mut session = Session::new(&gateway, invocation(), Counter::default());

    let (reason, ()) = tokio::join!(session.start(), async {
        let message = gateway.wait_for_message(0).await;
        gateway.react(&message, AUTHOR, ADD);
        gateway.react(&message, AUTHOR, ADD);
        gateway.unreact(&message, AUTHOR, ADD);
        gateway.say(CHANNEL, AUTHOR, "set 7");
        gateway.say(CHANNEL, AUTHOR, "done");
    });

    assert_eq!(reason.unwrap(), StopReason::Stopped);
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(!session.is_running());

    let message = gateway.sent()[0];
    assert_eq!(gateway.content_of(message.id), Some(Content::text("7")));
    assert!(gateway.reactions_on(message.id).is_empty());
    assert!(!gateway.is_deleted(message.id));
    assert_eq!(gateway.active_subscriptions(), 0);
    assert_eq!(gateway.subscribe_count(), 1);

    assert!(session.start().await.unwrap_err().is_invalid_state());
}

#[tokio::test]
async fn buttons_attach_in_declaration_order() {
    let gateway = MockGateway::new();
    let mut session = Session::new(&gateway, invocation(), Counter::default());
    let message = session.open().await.unwrap();

    assert_eq!(
        gateway.reactions_on(message.id),
        [Emoji::from(ADD), Emoji::from(DONE)]
    );
    session.close(StopReason::Stopped).await.unwrap();
}

#[tokio::test]
async fn failed_reaction_is_not_fatal() {
    let gateway = MockGateway::new();
    gateway.fail_reaction(ADD);
    let mut session = Session::new(&gateway, invocation(), Counter::default());

    let (reason, ()) = tokio::join!(session.start(), async {
        let message = gateway.wait_for_message(0).await;
        gateway.react(&message, AUTHOR, DONE);
    });

    assert_eq!(reason.unwrap(), StopReason::Stopped);
    // Only the reaction that was actually added gets removed.
    let removed: Vec<_> = gateway
        .calls()
        .into_iter()
        .filter(|call| matches!(call, GatewayCall::RemoveReaction { .. }))
        .collect();
    assert_eq!(removed.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_runs_hook_then_cleans_up() {
    let gateway = MockGateway::new();
    let mut session = Session::new(&gateway, invocation(), Counter::default())
        .with_config(SessionConfig::new().timeout(Duration::from_secs(5)));

    let reason = session.start().await.unwrap();
    assert_eq!(reason, StopReason::TimedOut);

    let message = gateway.sent()[0];
    assert_eq!(gateway.content_of(message.id), Some(Content::text("expired")));
    assert!(gateway.reactions_on(message.id).is_empty());
    assert_eq!(gateway.active_subscriptions(), 0);
    assert_eq!(session.into_interaction().timeouts, 1);
}

#[tokio::test(start_paused = true)]
async fn sliding_timeout_resets_on_handled_events() {
    init_tracing();
    let gateway = MockGateway::new();
    let mut session = Session::new(&gateway, invocation(), Counter::default())
        .with_config(SessionConfig::new().timeout(Duration::from_secs(10)));
    let started = Instant::now();

    let (reason, ()) = tokio::join!(session.start(), async {
        let message = gateway.wait_for_message(0).await;
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_secs(4)).await;
            gateway.react(&message, AUTHOR, ADD);
        }
        // Events from strangers are not activity.
        tokio::time::sleep(Duration::from_secs(8)).await;
        gateway.react(&message, UserId(99), ADD);
    });

    assert_eq!(reason.unwrap(), StopReason::TimedOut);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(22), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(23), "{elapsed:?}");

    let counter = session.into_interaction();
    assert_eq!(counter.count, 3);
    assert_eq!(counter.timeouts, 1);
}

#[tokio::test]
async fn message_deletion_ends_session_without_touching_message() {
    let gateway = MockGateway::new();
    let mut session = Session::new(&gateway, invocation(), Counter::default())
        .with_config(SessionConfig::new().clear_reactions(true));

    let (reason, ()) = tokio::join!(session.start(), async {
        let message = gateway.wait_for_message(0).await;
        gateway.delete_externally(&message);
    });

    assert_eq!(reason.unwrap(), StopReason::MessageDeleted);
    assert!(!has_call(&gateway, |call| matches!(
        call,
        GatewayCall::RemoveReaction { .. } | GatewayCall::ClearReactions { .. } | GatewayCall::Edit { .. }
    )));
    assert_eq!(gateway.active_subscriptions(), 0);
}

#[tokio::test]
async fn handler_failure_still_cleans_up() {
    init_tracing();
    let gateway = MockGateway::new();
    let mut session = Session::new(&gateway, invocation(), Counter::default());

    let (result, ()) = tokio::join!(session.start(), async {
        gateway.wait_for_message(0).await;
        gateway.say(CHANNEL, AUTHOR, "fail");
    });

    let err = result.unwrap_err();
    assert!(matches!(&err, InteractError::HandlerFailure { action, .. } if action == "Fail"));
    assert!(err.handler_source().is_some_and(InteractError::is_invalid_argument));

    assert_eq!(session.state(), SessionState::Stopped);
    let message = gateway.sent()[0];
    assert!(gateway.reactions_on(message.id).is_empty());
    assert_eq!(gateway.active_subscriptions(), 0);
}

#[tokio::test]
async fn stop_handle_works_from_outside() {
    let gateway = MockGateway::new();
    let mut session = Session::new(&gateway, invocation(), Counter::default());
    let stop = session.stop_handle();

    let (reason, ()) = tokio::join!(session.start(), async {
        gateway.wait_for_message(0).await;
        stop.stop();
        stop.stop();
    });

    assert_eq!(reason.unwrap(), StopReason::Stopped);
    assert!(stop.is_stopped());
    assert_eq!(gateway.active_subscriptions(), 0);
}

#[tokio::test]
async fn delete_disposition_removes_message() {
    let gateway = MockGateway::new();
    let mut session = Session::new(&gateway, invocation(), Counter::default())
        .with_config(SessionConfig::new().delete_after());

    let (reason, ()) = tokio::join!(session.start(), async {
        gateway.wait_for_message(0).await;
        gateway.say(CHANNEL, AUTHOR, "done");
    });

    assert_eq!(reason.unwrap(), StopReason::Stopped);
    assert!(gateway.is_deleted(gateway.sent()[0].id));
    assert!(!has_call(&gateway, |call| matches!(call, GatewayCall::RemoveReaction { .. })));
}

#[tokio::test]
async fn edit_disposition_and_clear_reactions() {
    let gateway = MockGateway::new();
    let config = SessionConfig::new()
        .disposition(Disposition::Edit(Content::text("closed")))
        .clear_reactions(true);
    let mut session = Session::new(&gateway, invocation(), Counter::default()).with_config(config);

    let (reason, ()) = tokio::join!(session.start(), async {
        gateway.wait_for_message(0).await;
        gateway.say(CHANNEL, AUTHOR, "done");
    });

    assert_eq!(reason.unwrap(), StopReason::Stopped);
    let message = gateway.sent()[0];
    assert_eq!(gateway.content_of(message.id), Some(Content::text("closed")));
    assert!(has_call(&gateway, |call| matches!(call, GatewayCall::ClearReactions { .. })));
}

#[tokio::test]
async fn only_allowed_users_are_dispatched() {
    let gateway = MockGateway::new();
    let helper = UserId(11);
    let config = SessionConfig::new().allowed_users(AllowedUsers::only([helper]));
    let mut session = Session::new(&gateway, invocation(), Counter::default()).with_config(config);

    let (reason, ()) = tokio::join!(session.start(), async {
        let message = gateway.wait_for_message(0).await;
        gateway.react(&message, AUTHOR, ADD);
        gateway.say(CHANNEL, AUTHOR, "done");
        gateway.react(&message, helper, ADD);
        gateway.say(CHANNEL, helper, "done");
    });

    assert_eq!(reason.unwrap(), StopReason::Stopped);
    assert_eq!(session.interaction().count, 1);
}

#[tokio::test]
async fn text_from_other_channels_is_ignored() {
    let gateway = MockGateway::new();
    let mut session = Session::new(&gateway, invocation(), Counter::default());
    let message = session.open().await.unwrap();

    let elsewhere = gateway.message_event(ChannelId(21), AUTHOR, "done");
    assert_eq!(session.dispatch(&elsewhere).await.unwrap(), Dispatch::Ignored);

    let unknown = gateway.message_event(CHANNEL, AUTHOR, "hello");
    assert_eq!(session.dispatch(&unknown).await.unwrap(), Dispatch::Ignored);

    let other_message = MessageHandle::new(MessageId(message.id.0 + 500), CHANNEL);
    let stray = gateway.reaction_event(&other_message, AUTHOR, ADD);
    assert_eq!(session.dispatch(&stray).await.unwrap(), Dispatch::Ignored);

    session.close(StopReason::Stopped).await.unwrap();
}

#[tokio::test]
async fn lost_connection_fails_after_cleanup() {
    init_tracing();
    let gateway = MockGateway::new();
    let mut session = Session::new(&gateway, invocation(), Counter::default());

    let (result, ()) = tokio::join!(session.start(), async {
        gateway.wait_for_message(0).await;
        gateway.disconnect();
    });

    assert!(result.unwrap_err().is_connection_lost());
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(gateway.reactions_on(gateway.sent()[0].id).is_empty());
}

#[tokio::test]
async fn lifecycle_events_are_reported() {
    use std::sync::{Arc, Mutex};

    let gateway = MockGateway::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut session = Session::new(&gateway, invocation(), Counter::default());
    let log = Arc::clone(&seen);
    session.on_event(Box::new(move |event| {
        log.lock().unwrap().push(format!("{event:?}"));
    }));

    let (reason, ()) = tokio::join!(session.start(), async {
        let message = gateway.wait_for_message(0).await;
        gateway.react(&message, AUTHOR, DONE);
    });
    assert_eq!(reason.unwrap(), StopReason::Stopped);

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        [
            "StateChanged(Starting)",
            "StateChanged(Running)",
            "Dispatched { action: \"Done\" }",
            "StateChanged(Stopping)",
            "Finished(Stopped)",
            "StateChanged(Stopped)",
        ]
    );
}
