// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the message store, transports, and the exchange controller.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a message record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generates a fresh random identifier.
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author of a message record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
}

/// Which wire protocol carries the conversation. Chosen once at startup.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TransportKind {
    /// One HTTP POST per turn, one JSON reply.
    #[default]
    RequestResponse,
    /// A persistent WebSocket carrying incremental chunks and an end marker.
    Streaming,
}

/// An event produced by a transport while a turn is outstanding.
///
/// A reply stream carries zero or more [`ReplyEvent::Chunk`]s followed by exactly
/// one terminal event: [`ReplyEvent::Complete`], [`ReplyEvent::End`], or an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    /// Incremental fragment of the assistant reply.
    Chunk(String),
    /// The full reply, delivered at once.
    Complete(String),
    /// The end marker was observed; no more chunks follow for this turn.
    End,
}

impl ReplyEvent {
    /// Returns true for events that close a turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReplyEvent::Complete(_) | ReplyEvent::End)
    }
}

/// Health status reported by transport health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Transport is fully operational.
    Healthy,
    /// Transport is operational but experiencing issues.
    Degraded(String),
    /// Transport is not operational.
    Unhealthy(String),
}
