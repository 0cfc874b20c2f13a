// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response transport for the Palaver chat client.
//!
//! Each turn is one `POST {"message": ...}` to the configured endpoint, answered
//! by one JSON body carrying the full reply. The reply stream therefore always
//! holds exactly one item.

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use palaver_config::model::HttpConfig;
use palaver_core::{
    HealthStatus, PalaverError, ReplyEvent, ReplyStream, TransportAdapter, TransportKind,
};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ChatRequest, ChatResponse};

/// HTTP transport implementing [`TransportAdapter`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Builds a transport from the `[http]` configuration section.
    pub fn new(config: &HttpConfig) -> Result<Self, PalaverError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| PalaverError::transport(format!("failed to build HTTP client: {e}"), e))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// The URL turns are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts one message and returns the reply text.
    pub async fn post_message(&self, text: &str) -> Result<String, PalaverError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { message: text })
            .send()
            .await
            .map_err(|e| PalaverError::transport(format!("HTTP request failed: {e}"), e))?;

        let status = response.status();
        debug!(status = %status, endpoint = %self.endpoint, "chat response received");

        let body = response
            .text()
            .await
            .map_err(|e| PalaverError::transport(format!("failed to read response body: {e}"), e))?;

        if !status.is_success() {
            return Err(PalaverError::Transport {
                message: format!("endpoint returned {status}: {body}"),
                source: None,
            });
        }

        let reply: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            PalaverError::Protocol {
                message: format!("response has no string `message` field: {e}"),
            }
        })?;
        Ok(reply.message)
    }
}

#[async_trait]
impl TransportAdapter for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn kind(&self) -> TransportKind {
        TransportKind::RequestResponse
    }

    async fn send(&self, text: &str) -> Result<ReplyStream, PalaverError> {
        let item = self.post_message(text).await.map(ReplyEvent::Complete);
        Ok(Box::pin(stream::iter([item])))
    }

    /// Probes the endpoint with a `HEAD` request.
    ///
    /// Any answer below 500 means the server is reachable (chat routes commonly
    /// reject `HEAD` with 405).
    async fn health_check(&self) -> Result<HealthStatus, PalaverError> {
        match self.client.head(&self.endpoint).send().await {
            Ok(resp) if resp.status().is_server_error() => Ok(HealthStatus::Degraded(format!(
                "endpoint returned {}",
                resp.status()
            ))),
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => {
                warn!(error = %e, endpoint = %self.endpoint, "HTTP health check failed");
                Ok(HealthStatus::Unhealthy(e.to_string()))
            }
        }
    }

    async fn shutdown(&self) -> Result<(), PalaverError> {
        Ok(())
    }
}
