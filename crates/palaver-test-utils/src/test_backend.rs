// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local chat backend for end-to-end tests.
//!
//! Serves `POST /echo` (replies with the posted message) and a scripted
//! WebSocket route at `/ws` on an ephemeral loopback port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use palaver_core::PalaverError;
use palaver_core::sentinel::DEFAULT_END_MARKER;

/// What the WebSocket route does in answer to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsAction {
    /// Send a text frame.
    Send(String),
    /// Close the connection.
    Close,
}

type ScriptFn = dyn Fn(&str) -> Vec<WsAction> + Send + Sync;

/// Maps each inbound WebSocket message to the frames sent back.
#[derive(Clone)]
pub struct WsScript(Arc<ScriptFn>);

impl WsScript {
    pub fn new(f: impl Fn(&str) -> Vec<WsAction> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Echoes the message back in two chunks followed by the end marker.
    pub fn echo_chunks() -> Self {
        Self::new(|text| {
            let mid = text
                .char_indices()
                .nth(text.chars().count() / 2)
                .map_or(text.len(), |(i, _)| i);
            let (head, tail) = text.split_at(mid);
            vec![
                WsAction::Send(head.to_string()),
                WsAction::Send(tail.to_string()),
                WsAction::Send(DEFAULT_END_MARKER.to_string()),
            ]
        })
    }

    /// Sends the same frames for every message.
    pub fn frames(frames: &[&str]) -> Self {
        let frames: Vec<WsAction> = frames
            .iter()
            .map(|f| WsAction::Send(f.to_string()))
            .collect();
        Self::new(move |_| frames.clone())
    }

    /// Sends the given frames, then closes the connection.
    pub fn frames_then_close(frames: &[&str]) -> Self {
        let mut actions: Vec<WsAction> = frames
            .iter()
            .map(|f| WsAction::Send(f.to_string()))
            .collect();
        actions.push(WsAction::Close);
        Self::new(move |_| actions.clone())
    }

    /// Never answers.
    pub fn silent() -> Self {
        Self::new(|_| Vec::new())
    }

    fn actions(&self, text: &str) -> Vec<WsAction> {
        (self.0)(text)
    }
}

impl Default for WsScript {
    fn default() -> Self {
        Self::echo_chunks()
    }
}

#[derive(Clone)]
struct BackendState {
    received: Arc<Mutex<Vec<String>>>,
    script: WsScript,
    echo_delay: Duration,
}

/// A running test backend. Dropping it stops accepting new connections.
pub struct TestBackend {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TestBackend {
    /// Starts a backend with the echo WebSocket script and no HTTP delay.
    pub async fn start() -> Result<Self, PalaverError> {
        Self::start_with(WsScript::default(), Duration::ZERO).await
    }

    /// Starts a backend with a custom WebSocket script.
    pub async fn with_ws_script(script: WsScript) -> Result<Self, PalaverError> {
        Self::start_with(script, Duration::ZERO).await
    }

    /// Starts a backend whose `/echo` route waits `echo_delay` before answering.
    pub async fn start_with(script: WsScript, echo_delay: Duration) -> Result<Self, PalaverError> {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = BackendState {
            received: received.clone(),
            script,
            echo_delay,
        };

        let app = Router::new()
            .route("/echo", post(echo))
            .route("/ws", get(ws_upgrade))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| PalaverError::Internal(format!("test backend bind failed: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| PalaverError::Internal(format!("test backend address: {e}")))?;

        let cancel = CancellationToken::new();
        let shutdown = cancel.clone();
        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await;
            if let Err(e) = served {
                debug!(error = %e, "test backend stopped with error");
            }
        });
        debug!(%addr, "test backend listening");

        Ok(Self {
            addr,
            received,
            cancel,
            handle: Some(handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// URL of the HTTP echo route.
    pub fn echo_url(&self) -> String {
        format!("http://{}/echo", self.addr)
    }

    /// URL of the WebSocket route.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Every message received on either route, in arrival order.
    pub async fn received(&self) -> Vec<String> {
        self.received.lock().await.clone()
    }

    /// Stops the server and waits for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn echo(State(state): State<BackendState>, Json(body): Json<Value>) -> Json<Value> {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    state.received.lock().await.push(message.clone());
    if !state.echo_delay.is_zero() {
        tokio::time::sleep(state.echo_delay).await;
    }
    Json(json!({ "message": message }))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<BackendState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(mut socket: WebSocket, state: BackendState) {
    while let Some(Ok(msg)) = socket.recv().await {
        let Message::Text(text) = msg else {
            continue;
        };
        state.received.lock().await.push(text.as_str().to_owned());

        for action in state.script.actions(text.as_str()) {
            match action {
                WsAction::Send(frame) => {
                    if socket.send(Message::Text(frame.into())).await.is_err() {
                        return;
                    }
                }
                WsAction::Close => {
                    let _ = socket.send(Message::Close(None)).await;
                    return;
                }
            }
        }
    }
}
