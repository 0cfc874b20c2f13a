// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Palaver chat client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use palaver_core::sentinel::DEFAULT_END_MARKER;
use palaver_core::TransportKind;
use serde::{Deserialize, Serialize};

/// Top-level Palaver configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to the values the reference backend expects.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PalaverConfig {
    /// Client behavior settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Which transport carries the conversation.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Request/response transport settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Streaming (WebSocket) transport settings.
    #[serde(default)]
    pub streaming: StreamingConfig,
}

impl PalaverConfig {
    /// Returns the endpoint of the selected transport.
    pub fn active_endpoint(&self) -> &str {
        match self.transport.kind {
            TransportKind::RequestResponse => &self.http.endpoint,
            TransportKind::Streaming => &self.streaming.endpoint,
        }
    }

    /// Overrides the endpoint of the selected transport.
    pub fn set_active_endpoint(&mut self, endpoint: impl Into<String>) {
        match self.transport.kind {
            TransportKind::RequestResponse => self.http.endpoint = endpoint.into(),
            TransportKind::Streaming => self.streaming.endpoint = endpoint.into(),
        }
    }
}

/// Client behavior configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Text of the assistant record shown when a turn fails.
    #[serde(default = "default_error_placeholder")]
    pub error_placeholder: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            error_placeholder: default_error_placeholder(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_error_placeholder() -> String {
    "Error: Could not connect to server.".to_string()
}

/// Transport selection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// `request-response` (HTTP POST) or `streaming` (WebSocket).
    #[serde(default)]
    pub kind: TransportKind,
}

/// Request/response transport configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// URL that receives `POST {"message": ...}`.
    #[serde(default = "default_http_endpoint")]
    pub endpoint: String,

    /// Whole-request timeout. `None` leaves the HTTP client's default (no timeout).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            endpoint: default_http_endpoint(),
            timeout_secs: None,
        }
    }
}

fn default_http_endpoint() -> String {
    "http://localhost:8502/api/chat/weather".to_string()
}

/// Streaming transport configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreamingConfig {
    /// WebSocket URI opened once at startup.
    #[serde(default = "default_ws_endpoint")]
    pub endpoint: String,

    /// Marker the peer sends to end a turn. Never displayed.
    #[serde(default = "default_end_marker")]
    pub end_marker: String,

    /// Seconds a turn may wait for the end marker before it fails. `0` waits forever.
    ///
    /// Frames carry no turn id. Late frames for a timed-out turn are dropped
    /// until the next message is sent, but any that arrive after that are read
    /// as part of the new reply, and a late end marker finishes it early.
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,

    /// Seconds allowed for the initial WebSocket handshake.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ws_endpoint(),
            end_marker: default_end_marker(),
            turn_timeout_secs: default_turn_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_ws_endpoint() -> String {
    "ws://localhost:8090".to_string()
}

fn default_end_marker() -> String {
    DEFAULT_END_MARKER.to_string()
}

fn default_turn_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}
