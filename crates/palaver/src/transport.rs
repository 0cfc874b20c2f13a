// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport selection: one variant per wire protocol, chosen once at startup.

use async_trait::async_trait;
use palaver_config::PalaverConfig;
use palaver_core::{HealthStatus, PalaverError, ReplyStream, TransportAdapter, TransportKind};
use tracing::info;

#[cfg(not(any(feature = "http", feature = "websocket")))]
compile_error!("enable at least one of the `http` or `websocket` features");

/// The transport the session runs on.
pub enum ActiveTransport {
    #[cfg(feature = "http")]
    Http(palaver_http::HttpTransport),
    #[cfg(feature = "websocket")]
    WebSocket(palaver_ws::WsTransport),
}

impl ActiveTransport {
    /// Builds the transport named by `transport.kind`. The streaming variant
    /// opens its connection here.
    pub async fn connect(config: &PalaverConfig) -> Result<Self, PalaverError> {
        let kind = config.transport.kind;
        info!(%kind, endpoint = config.active_endpoint(), "initializing transport");

        match kind {
            #[cfg(feature = "http")]
            TransportKind::RequestResponse => Ok(Self::Http(palaver_http::HttpTransport::new(
                &config.http,
            )?)),
            #[cfg(feature = "websocket")]
            TransportKind::Streaming => Ok(Self::WebSocket(
                palaver_ws::WsTransport::connect(&config.streaming).await?,
            )),
            #[allow(unreachable_patterns)]
            other => Err(PalaverError::Config(format!(
                "transport `{other}` is not compiled into this build"
            ))),
        }
    }
}

/// Footer label for a transport kind.
pub fn mode_label(kind: TransportKind) -> &'static str {
    match kind {
        TransportKind::RequestResponse => "HTTP",
        TransportKind::Streaming => "WebSocket",
    }
}

#[async_trait]
impl TransportAdapter for ActiveTransport {
    fn name(&self) -> &str {
        match self {
            #[cfg(feature = "http")]
            Self::Http(t) => t.name(),
            #[cfg(feature = "websocket")]
            Self::WebSocket(t) => t.name(),
        }
    }

    fn kind(&self) -> TransportKind {
        match self {
            #[cfg(feature = "http")]
            Self::Http(t) => t.kind(),
            #[cfg(feature = "websocket")]
            Self::WebSocket(t) => t.kind(),
        }
    }

    async fn send(&self, text: &str) -> Result<ReplyStream, PalaverError> {
        match self {
            #[cfg(feature = "http")]
            Self::Http(t) => t.send(text).await,
            #[cfg(feature = "websocket")]
            Self::WebSocket(t) => t.send(text).await,
        }
    }

    async fn health_check(&self) -> Result<HealthStatus, PalaverError> {
        match self {
            #[cfg(feature = "http")]
            Self::Http(t) => t.health_check().await,
            #[cfg(feature = "websocket")]
            Self::WebSocket(t) => t.health_check().await,
        }
    }

    async fn shutdown(&self) -> Result<(), PalaverError> {
        match self {
            #[cfg(feature = "http")]
            Self::Http(t) => t.shutdown().await,
            #[cfg(feature = "websocket")]
            Self::WebSocket(t) => t.shutdown().await,
        }
    }
}
