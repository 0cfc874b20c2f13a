// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming transport over a persistent WebSocket.
//!
//! The connection is opened once by [`WsTransport::connect`] and reused for
//! every turn. Each turn writes one text frame and then listens for reply
//! chunks until a frame carrying the end marker arrives. A closed connection is
//! never reopened; later turns fail fast with [`PalaverError::NotConnected`].

mod reader;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, SplitSink};
use futures::{SinkExt, StreamExt};
use palaver_config::model::StreamingConfig;
use palaver_core::{
    HealthStatus, PalaverError, ReplyEvent, ReplyStream, TransportAdapter, TransportKind,
};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::reader::{Listener, ListenerSlot};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Buffered reply events per turn before the reader waits on the consumer.
const LISTENER_CAPACITY: usize = 64;

/// WebSocket transport implementing [`TransportAdapter`].
pub struct WsTransport {
    endpoint: String,
    sink: Mutex<WsSink>,
    listener: ListenerSlot,
    open: Arc<AtomicBool>,
    cancel: CancellationToken,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl WsTransport {
    /// Opens the connection described by the `[streaming]` section and starts
    /// the background reader.
    pub async fn connect(config: &StreamingConfig) -> Result<Self, PalaverError> {
        let endpoint = config.endpoint.clone();
        let timeout = Duration::from_secs(config.connect_timeout_secs);

        let (socket, _response) =
            tokio::time::timeout(timeout, tokio_tungstenite::connect_async(endpoint.as_str()))
                .await
                .map_err(|_| PalaverError::Timeout { duration: timeout })?
                .map_err(|e| {
                    PalaverError::transport(format!("failed to connect to {endpoint}: {e}"), e)
                })?;
        info!(endpoint = %endpoint, "websocket connected");

        let (sink, stream) = socket.split();
        let listener: ListenerSlot = Arc::new(Mutex::new(None));
        let open = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();

        let reader = tokio::spawn(reader::read_loop(
            stream,
            listener.clone(),
            open.clone(),
            config.end_marker.clone(),
            cancel.clone(),
        ));

        Ok(Self {
            endpoint,
            sink: Mutex::new(sink),
            listener,
            open,
            cancel,
            reader: Mutex::new(Some(reader)),
        })
    }

    /// The URI this transport is connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether the connection is still usable.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn not_connected(&self) -> PalaverError {
        PalaverError::NotConnected {
            endpoint: self.endpoint.clone(),
        }
    }
}

#[async_trait]
impl TransportAdapter for WsTransport {
    fn name(&self) -> &str {
        "websocket"
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Streaming
    }

    async fn send(&self, text: &str) -> Result<ReplyStream, PalaverError> {
        if !self.is_open() {
            return Err(self.not_connected());
        }

        let (tx, rx) = mpsc::channel(LISTENER_CAPACITY);
        let guard = ListenerGuard {
            slot: self.listener.clone(),
            listener: tx.downgrade(),
        };
        {
            let mut slot = self.listener.lock().await;
            if slot.replace(tx).is_some() {
                debug!("replaced listener of an unfinished turn");
            }
            // The reader clears `open` before draining the slot, so a close that
            // raced with registration is visible here.
            if !self.is_open() {
                slot.take();
                return Err(self.not_connected());
            }
        }

        let written = self
            .sink
            .lock()
            .await
            .send(Message::Text(text.to_owned().into()))
            .await;
        if let Err(e) = written {
            self.listener.lock().await.take();
            warn!(error = %e, "websocket write failed");
            return Err(PalaverError::transport(format!("failed to send frame: {e}"), e));
        }
        debug!(len = text.len(), "turn frame sent");

        let events = stream::unfold((rx, guard), |(mut rx, guard)| async move {
            rx.recv().await.map(|event| (event, (rx, guard)))
        });
        Ok(Box::pin(events))
    }

    async fn health_check(&self) -> Result<HealthStatus, PalaverError> {
        if self.is_open() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy(format!(
                "connection to {} is closed",
                self.endpoint
            )))
        }
    }

    /// Sends a close frame and stops the reader.
    async fn shutdown(&self) -> Result<(), PalaverError> {
        if self.is_open() {
            let mut sink = self.sink.lock().await;
            if let Err(e) = sink.send(Message::Close(None)).await {
                debug!(error = %e, "close frame not delivered");
            }
        }
        self.cancel.cancel();
        if let Some(handle) = self.reader.lock().await.take() {
            handle
                .await
                .map_err(|e| PalaverError::Internal(format!("websocket reader panicked: {e}")))?;
        }
        info!(endpoint = %self.endpoint, "websocket transport shut down");
        Ok(())
    }
}

/// Detaches a turn's listener when its reply stream is dropped before the end
/// marker, as happens when the turn deadline fires. Frames the peer sends later
/// are then ignored instead of waiting for the next turn to claim the slot.
struct ListenerGuard {
    slot: ListenerSlot,
    listener: mpsc::WeakSender<Result<ReplyEvent, PalaverError>>,
}

/// Clears `slot` only if it still holds `listener`.
fn detach_if_current(
    slot: &mut Option<Listener>,
    listener: &mpsc::WeakSender<Result<ReplyEvent, PalaverError>>,
) {
    let Some(ours) = listener.upgrade() else {
        return;
    };
    if slot.as_ref().is_some_and(|current| current.same_channel(&ours)) {
        slot.take();
        debug!("abandoned turn listener detached");
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.try_lock() {
            detach_if_current(&mut slot, &self.listener);
            return;
        }
        // The reader holds the slot; finish once it lets go.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let slot = self.slot.clone();
            let listener = self.listener.clone();
            handle.spawn(async move {
                detach_if_current(&mut *slot.lock().await, &listener);
            });
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
