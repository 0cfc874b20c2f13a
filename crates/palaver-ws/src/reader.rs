// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background task that drains inbound frames and routes them to the turn
//! currently waiting for a reply.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::{Stream, StreamExt};
use palaver_core::sentinel;
use palaver_core::{PalaverError, ReplyEvent};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Sender half of the per-turn listener.
pub(crate) type Listener = mpsc::Sender<Result<ReplyEvent, PalaverError>>;

/// Slot holding the listener of the outstanding turn, if any.
pub(crate) type ListenerSlot = Arc<Mutex<Option<Listener>>>;

/// Reads frames until the peer closes, the socket fails, or `cancel` fires.
///
/// On exit the connection is marked closed and any waiting turn receives
/// [`PalaverError::ConnectionClosed`].
pub(crate) async fn read_loop<S>(
    mut stream: S,
    slot: ListenerSlot,
    open: Arc<AtomicBool>,
    end_marker: String,
    cancel: CancellationToken,
) where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("websocket reader cancelled");
                break;
            }
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => dispatch(text.as_str(), &end_marker, &slot).await,
            Some(Ok(Message::Close(close))) => {
                debug!(?close, "websocket closed by peer");
                break;
            }
            // Binary, ping and pong frames carry no chat content.
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(error = %e, "websocket read failed");
                break;
            }
            None => {
                debug!("websocket stream ended");
                break;
            }
        }
    }

    open.store(false, Ordering::SeqCst);
    if let Some(listener) = slot.lock().await.take() {
        let _ = listener.send(Err(PalaverError::ConnectionClosed)).await;
    }
}

/// Routes one text frame to the active listener.
///
/// A frame carrying the end marker emits its leading text, then
/// [`ReplyEvent::End`], and detaches the listener so later frames are dropped.
pub(crate) async fn dispatch(text: &str, end_marker: &str, slot: &Mutex<Option<Listener>>) {
    let mut slot = slot.lock().await;
    let Some(listener) = slot.as_ref() else {
        debug!(len = text.len(), "frame with no active turn ignored");
        return;
    };

    let frame = sentinel::classify(text, end_marker);
    let ends_turn = frame.is_end();
    for event in frame.into_events() {
        if listener.send(Ok(event)).await.is_err() {
            debug!("turn listener dropped, detaching");
            slot.take();
            return;
        }
    }

    if ends_turn {
        slot.take();
    }
}
