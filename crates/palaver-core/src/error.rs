// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Palaver chat client.

use thiserror::Error;

/// The primary error type used by transports, the exchange controller, and the binary.
#[derive(Debug, Error)]
pub enum PalaverError {
    /// Configuration errors (invalid endpoint, disabled transport, bad header value).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport failures (connection refused, non-success status, socket write failure).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote side answered with a payload that does not match the wire contract.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// The streaming connection was not open when a turn was submitted.
    #[error("not connected to {endpoint}")]
    NotConnected { endpoint: String },

    /// The streaming connection closed while a turn was waiting for its reply.
    #[error("connection closed before the reply finished")]
    ConnectionClosed,

    /// A turn did not reach a terminal event within its deadline.
    #[error("turn timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PalaverError {
    /// Builds a [`PalaverError::Transport`] that keeps the underlying error as its source.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
