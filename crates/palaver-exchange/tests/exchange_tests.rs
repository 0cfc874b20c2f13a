// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn lifecycle tests driving the controller through a mock transport.

use std::time::Duration;

use palaver_core::{ReplyEvent, Role, TransportKind};
use palaver_exchange::{Reconciled, Status, TurnEvent, TurnEventKind, TurnId, TurnOutcome};
use palaver_test_utils::{MockReply, TestHarness};

const PLACEHOLDER: &str = "Error: Could not connect to server.";

fn user(s: &str) -> (Role, String) {
    (Role::User, s.to_string())
}

fn assistant(s: &str) -> (Role, String) {
    (Role::Assistant, s.to_string())
}

#[tokio::test]
async fn user_record_precedes_transport_call() {
    let mut harness = TestHarness::builder()
        .with_replies(vec![MockReply::Hang])
        .build();

    assert!(harness.controller.submit("hello"));
    // Appended synchronously, before the spawned call has had a chance to run.
    assert_eq!(harness.transcript(), vec![user("hello")]);
    assert_eq!(harness.transport.sent_count().await, 0);
    assert_eq!(harness.controller.status(), Status::InFlight);
}

#[tokio::test]
async fn submissions_are_refused_while_in_flight_or_empty() {
    let mut harness = TestHarness::builder()
        .with_replies(vec![MockReply::Hang])
        .build();

    assert!(!harness.controller.submit("   "));
    assert!(harness.controller.store().is_empty());

    assert!(harness.controller.submit("first"));
    assert!(!harness.controller.submit("second"));
    assert_eq!(harness.send_message("third").await, TurnOutcome::Rejected);
    assert_eq!(harness.transcript(), vec![user("first")]);
}

#[tokio::test]
async fn request_response_reply_lands_as_one_record() {
    let mut harness = TestHarness::builder()
        .with_replies(vec![MockReply::Complete("hi".into())])
        .build();

    let outcome = harness.send_message("hello").await;
    assert!(matches!(outcome, TurnOutcome::Completed { reply: Some(_) }));
    assert_eq!(harness.transcript(), vec![user("hello"), assistant("hi")]);
    assert_eq!(harness.controller.status(), Status::Idle);
}

#[tokio::test]
async fn streamed_chunks_build_one_record() {
    let mut harness = TestHarness::builder()
        .with_kind(TransportKind::Streaming)
        .with_replies(vec![MockReply::chunks(&["He", "llo"])])
        .build();

    harness.send_message("hi").await;
    assert_eq!(harness.transcript(), vec![user("hi"), assistant("Hello")]);
    assert_eq!(harness.controller.status(), Status::Idle);
    assert!(harness.controller.store().in_progress().is_none());
}

#[tokio::test]
async fn events_from_other_turns_do_not_duplicate_records() {
    let mut harness = TestHarness::builder()
        .with_kind(TransportKind::Streaming)
        .with_replies(vec![MockReply::chunks(&["He", "llo"])])
        .build();

    assert!(harness.controller.submit("hi"));
    let stale = harness
        .controller
        .apply(TurnEvent::new(TurnId(0), TurnEventKind::Chunk("old".into())));
    assert_eq!(stale, Reconciled::Ignored);

    while harness.controller.is_in_flight() {
        let event = harness.controller.next_event().await.unwrap();
        harness.controller.apply(event);
    }
    assert_eq!(harness.transcript(), vec![user("hi"), assistant("Hello")]);
}

#[tokio::test]
async fn send_failure_yields_one_placeholder() {
    let mut harness = TestHarness::builder()
        .with_kind(TransportKind::Streaming)
        .with_replies(vec![MockReply::SendError("not connected".into())])
        .build();

    let outcome = harness.send_message("hi").await;
    assert!(matches!(outcome, TurnOutcome::Failed { .. }));
    assert_eq!(harness.transcript(), vec![user("hi"), assistant(PLACEHOLDER)]);
    assert_eq!(harness.controller.status(), Status::Idle);
}

#[tokio::test]
async fn mid_stream_failure_keeps_partial_text() {
    let mut harness = TestHarness::builder()
        .with_kind(TransportKind::Streaming)
        .with_replies(vec![MockReply::ChunksThenError(
            vec!["Hel".into()],
            "connection reset".into(),
        )])
        .build();

    harness.send_message("hi").await;
    assert_eq!(
        harness.transcript(),
        vec![user("hi"), assistant("Hel"), assistant(PLACEHOLDER)]
    );
}

#[tokio::test]
async fn truncated_stream_counts_as_failure() {
    let mut harness = TestHarness::builder()
        .with_kind(TransportKind::Streaming)
        .with_replies(vec![MockReply::Truncated(vec!["part".into()])])
        .build();

    let outcome = harness.send_message("hi").await;
    assert!(matches!(outcome, TurnOutcome::Failed { .. }));
    assert_eq!(
        harness.transcript(),
        vec![user("hi"), assistant("part"), assistant(PLACEHOLDER)]
    );
}

#[tokio::test]
async fn duplicate_termination_is_ignored() {
    let mut harness = TestHarness::builder()
        .with_kind(TransportKind::Streaming)
        .with_replies(vec![MockReply::Events(vec![
            ReplyEvent::Chunk("done".into()),
            ReplyEvent::End,
            ReplyEvent::End,
        ])])
        .build();

    harness.send_message("hi").await;
    let before = harness.transcript();

    // The forwarding task stops at the first terminal event, but inject a late
    // one for the finished turn to be sure.
    let late = harness
        .controller
        .apply(TurnEvent::new(TurnId(1), TurnEventKind::Ended));
    assert_eq!(late, Reconciled::Ignored);
    assert_eq!(harness.transcript(), before);
    assert_eq!(before, vec![user("hi"), assistant("done")]);
}

#[tokio::test]
async fn end_without_text_adds_no_record() {
    let mut harness = TestHarness::builder()
        .with_kind(TransportKind::Streaming)
        .with_replies(vec![MockReply::chunks(&[])])
        .build();

    let outcome = harness.send_message("hi").await;
    assert_eq!(outcome, TurnOutcome::Completed { reply: None });
    assert_eq!(harness.transcript(), vec![user("hi")]);
}

#[tokio::test]
async fn consecutive_turns_stay_ordered() {
    let mut harness = TestHarness::builder()
        .with_kind(TransportKind::Streaming)
        .with_replies(vec![
            MockReply::chunks(&["one"]),
            MockReply::SendError("down".into()),
            MockReply::chunks(&["th", "ree"]),
        ])
        .build();

    harness.send_message("a").await;
    harness.send_message("b").await;
    harness.send_message("c").await;

    assert_eq!(
        harness.transcript(),
        vec![
            user("a"),
            assistant("one"),
            user("b"),
            assistant(PLACEHOLDER),
            user("c"),
            assistant("three"),
        ]
    );
    assert_eq!(harness.transport.sent_texts().await, vec!["a", "b", "c"]);
}

#[tokio::test(start_paused = true)]
async fn hung_turn_times_out() {
    let mut harness = TestHarness::builder()
        .with_kind(TransportKind::Streaming)
        .with_turn_timeout(Duration::from_secs(120))
        .with_error_placeholder("Timed out.")
        .with_replies(vec![MockReply::Hang])
        .build();

    let outcome = harness.send_message("hello?").await;
    assert!(matches!(outcome, TurnOutcome::Failed { .. }));
    assert_eq!(harness.transcript(), vec![user("hello?"), assistant("Timed out.")]);

    // The controller accepts new turns afterwards.
    assert!(harness.controller.submit("again"));
}
