// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport adapter for deterministic testing.
//!
//! `MockTransport` implements `TransportAdapter` with scripted per-turn replies
//! and records every text it was asked to send.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;

use palaver_core::{
    HealthStatus, PalaverError, ReplyEvent, ReplyStream, TransportAdapter, TransportKind,
};

/// Scripted reply for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// A single `Complete` event, as the request/response transport produces.
    Complete(String),
    /// The given chunks followed by `End`.
    Chunks(Vec<String>),
    /// The given chunks, then a stream error with this message.
    ChunksThenError(Vec<String>, String),
    /// `send` itself fails with a transport error carrying this message.
    SendError(String),
    /// The given chunks, then the stream ends with no terminal event.
    Truncated(Vec<String>),
    /// A stream that never yields.
    Hang,
    /// Arbitrary events, yielded as-is.
    Events(Vec<ReplyEvent>),
}

impl MockReply {
    /// Chunks built from string slices, followed by `End`.
    pub fn chunks(parts: &[&str]) -> Self {
        MockReply::Chunks(parts.iter().map(|s| s.to_string()).collect())
    }
}

/// A mock transport that replays scripted replies in FIFO order.
///
/// When the queue is empty, every turn is answered with
/// `Complete("mock response")`.
pub struct MockTransport {
    kind: TransportKind,
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    sent: Arc<Mutex<Vec<String>>>,
    healthy: bool,
}

impl MockTransport {
    /// Create a request/response mock with an empty reply queue.
    pub fn new() -> Self {
        Self::with_replies(TransportKind::RequestResponse, Vec::new())
    }

    /// Create a mock of the given kind pre-loaded with replies.
    pub fn with_replies(kind: TransportKind, replies: Vec<MockReply>) -> Self {
        Self {
            kind,
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            sent: Arc::new(Mutex::new(Vec::new())),
            healthy: true,
        }
    }

    /// Makes `health_check` report the transport as unhealthy.
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Add a reply to the end of the queue.
    pub async fn add_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Texts passed to `send`, in call order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    async fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::Complete("mock response".to_string()))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn mock_error(message: String) -> PalaverError {
    PalaverError::Transport {
        message,
        source: None,
    }
}

fn chunk_items(chunks: Vec<String>) -> Vec<Result<ReplyEvent, PalaverError>> {
    chunks.into_iter().map(|c| Ok(ReplyEvent::Chunk(c))).collect()
}

#[async_trait]
impl TransportAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn send(&self, text: &str) -> Result<ReplyStream, PalaverError> {
        self.sent.lock().await.push(text.to_string());

        let items = match self.next_reply().await {
            MockReply::Complete(message) => vec![Ok(ReplyEvent::Complete(message))],
            MockReply::Chunks(chunks) => {
                let mut items = chunk_items(chunks);
                items.push(Ok(ReplyEvent::End));
                items
            }
            MockReply::ChunksThenError(chunks, message) => {
                let mut items = chunk_items(chunks);
                items.push(Err(mock_error(message)));
                items
            }
            MockReply::SendError(message) => return Err(mock_error(message)),
            MockReply::Truncated(chunks) => chunk_items(chunks),
            MockReply::Hang => {
                return Ok(Box::pin(stream::pending::<Result<ReplyEvent, PalaverError>>()));
            }
            MockReply::Events(events) => events.into_iter().map(Ok).collect(),
        };
        Ok(Box::pin(stream::iter(items)))
    }

    async fn health_check(&self) -> Result<HealthStatus, PalaverError> {
        if self.healthy {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy("mock marked unhealthy".to_string()))
        }
    }

    async fn shutdown(&self) -> Result<(), PalaverError> {
        Ok(())
    }
}
