// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket transport tests against a local scripted backend.

use std::time::Duration;

use futures::StreamExt;
use palaver_config::model::StreamingConfig;
use palaver_core::{HealthStatus, PalaverError, ReplyEvent, TransportAdapter, TransportKind};
use palaver_test_utils::{TestBackend, WsScript};
use palaver_ws::WsTransport;

fn config(endpoint: String) -> StreamingConfig {
    StreamingConfig {
        endpoint,
        connect_timeout_secs: 5,
        ..StreamingConfig::default()
    }
}

async fn collect(t: &WsTransport, text: &str) -> Vec<Result<ReplyEvent, PalaverError>> {
    let stream = t.send(text).await.expect("send should be accepted");
    tokio::time::timeout(Duration::from_secs(5), stream.collect::<Vec<_>>())
        .await
        .expect("reply should finish")
}

fn ok_events(items: Vec<Result<ReplyEvent, PalaverError>>) -> Vec<ReplyEvent> {
    items.into_iter().map(|e| e.expect("no error expected")).collect()
}

#[tokio::test]
async fn chunks_then_marker_end_the_turn() {
    let backend = TestBackend::with_ws_script(WsScript::frames(&["He", "llo", "[END]"]))
        .await
        .unwrap();
    let transport = WsTransport::connect(&config(backend.ws_url())).await.unwrap();
    assert_eq!(transport.kind(), TransportKind::Streaming);

    let events = ok_events(collect(&transport, "hi").await);
    assert_eq!(
        events,
        vec![
            ReplyEvent::Chunk("He".into()),
            ReplyEvent::Chunk("llo".into()),
            ReplyEvent::End
        ]
    );
    assert_eq!(backend.received().await, vec!["hi"]);
}

#[tokio::test]
async fn connection_is_reused_across_turns() {
    let backend = TestBackend::start().await.unwrap();
    let transport = WsTransport::connect(&config(backend.ws_url())).await.unwrap();

    let first = ok_events(collect(&transport, "Hello").await);
    let second = ok_events(collect(&transport, "abcd").await);

    assert_eq!(
        first,
        vec![
            ReplyEvent::Chunk("He".into()),
            ReplyEvent::Chunk("llo".into()),
            ReplyEvent::End
        ]
    );
    assert_eq!(
        second,
        vec![
            ReplyEvent::Chunk("ab".into()),
            ReplyEvent::Chunk("cd".into()),
            ReplyEvent::End
        ]
    );
    assert_eq!(backend.received().await, vec!["Hello", "abcd"]);
    assert_eq!(transport.health_check().await.unwrap(), HealthStatus::Healthy);
}

#[tokio::test]
async fn text_after_marker_is_dropped() {
    let backend = TestBackend::with_ws_script(WsScript::frames(&["Hi", " there[END]ignored"]))
        .await
        .unwrap();
    let transport = WsTransport::connect(&config(backend.ws_url())).await.unwrap();

    let events = ok_events(collect(&transport, "x").await);
    assert_eq!(
        events,
        vec![
            ReplyEvent::Chunk("Hi".into()),
            ReplyEvent::Chunk(" there".into()),
            ReplyEvent::End
        ]
    );
}

#[tokio::test]
async fn custom_end_marker() {
    let backend = TestBackend::with_ws_script(WsScript::frames(&["a", "<<EOT>>"]))
        .await
        .unwrap();
    let cfg = StreamingConfig {
        end_marker: "<<EOT>>".into(),
        ..config(backend.ws_url())
    };
    let transport = WsTransport::connect(&cfg).await.unwrap();

    let events = ok_events(collect(&transport, "x").await);
    assert_eq!(events, vec![ReplyEvent::Chunk("a".into()), ReplyEvent::End]);
}

#[tokio::test]
async fn peer_close_fails_waiting_turn_and_later_sends() {
    let backend = TestBackend::with_ws_script(WsScript::frames_then_close(&["par"]))
        .await
        .unwrap();
    let transport = WsTransport::connect(&config(backend.ws_url())).await.unwrap();

    let items = collect(&transport, "hi").await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), &ReplyEvent::Chunk("par".into()));
    assert!(matches!(items[1], Err(PalaverError::ConnectionClosed)));

    assert!(!transport.is_open());
    match transport.send("again").await {
        Err(PalaverError::NotConnected { endpoint }) => assert_eq!(endpoint, backend.ws_url()),
        Err(other) => panic!("expected NotConnected, got {other:?}"),
        Ok(_) => panic!("send on a closed connection should fail"),
    }
    assert!(matches!(
        transport.health_check().await.unwrap(),
        HealthStatus::Unhealthy(_)
    ));
}

#[tokio::test]
async fn shutdown_closes_connection() {
    let backend = TestBackend::start().await.unwrap();
    let transport = WsTransport::connect(&config(backend.ws_url())).await.unwrap();

    transport.shutdown().await.unwrap();
    assert!(!transport.is_open());
    assert!(matches!(
        transport.send("hi").await,
        Err(PalaverError::NotConnected { .. })
    ));
}

#[tokio::test]
async fn connect_to_missing_server_fails() {
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let result = WsTransport::connect(&config(format!("ws://127.0.0.1:{port}/ws"))).await;
    assert!(matches!(result, Err(PalaverError::Transport { .. })));
}
