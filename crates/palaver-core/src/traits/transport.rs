// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport adapter trait for the wire protocols that carry a chat turn.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::PalaverError;
use crate::types::{HealthStatus, ReplyEvent, TransportKind};

/// Stream of events for one turn: chunks, then exactly one terminal item.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<ReplyEvent, PalaverError>> + Send>>;

/// Adapter for a chat endpoint.
///
/// Both the request/response and the streaming transport expose the same
/// contract: `send` returns a stream of zero or more [`ReplyEvent::Chunk`]s
/// followed by one terminal event ([`ReplyEvent::Complete`], [`ReplyEvent::End`],
/// or an error). The exchange controller relies on nothing else.
#[async_trait]
pub trait TransportAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this transport instance.
    fn name(&self) -> &str;

    /// Returns which protocol this transport speaks.
    fn kind(&self) -> TransportKind;

    /// Sends one user turn and returns the stream of reply events for it.
    ///
    /// Fails immediately if the transport cannot accept the turn (for example a
    /// streaming connection that is no longer open).
    async fn send(&self, text: &str) -> Result<ReplyStream, PalaverError>;

    /// Performs a health check and returns the transport's current status.
    async fn health_check(&self) -> Result<HealthStatus, PalaverError>;

    /// Releases any held connection.
    async fn shutdown(&self) -> Result<(), PalaverError>;
}
