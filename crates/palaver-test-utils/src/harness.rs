// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness pairing an [`ExchangeController`] with a [`MockTransport`].

use std::sync::Arc;
use std::time::Duration;

use palaver_core::{Role, TransportKind};
use palaver_exchange::{ExchangeController, ExchangeOptions, TurnOutcome};

use crate::mock_transport::{MockReply, MockTransport};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    kind: TransportKind,
    replies: Vec<MockReply>,
    options: ExchangeOptions,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            kind: TransportKind::RequestResponse,
            replies: Vec::new(),
            options: ExchangeOptions::default(),
        }
    }

    /// Set the scripted replies, consumed one per turn.
    pub fn with_replies(mut self, replies: Vec<MockReply>) -> Self {
        self.replies = replies;
        self
    }

    /// Set the kind the mock transport reports.
    pub fn with_kind(mut self, kind: TransportKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.options.turn_timeout = Some(timeout);
        self
    }

    pub fn with_error_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.options.error_placeholder = placeholder.into();
        self
    }

    pub fn build(self) -> TestHarness {
        let transport = Arc::new(MockTransport::with_replies(self.kind, self.replies));
        let controller = ExchangeController::new(transport.clone(), self.options);
        TestHarness {
            controller,
            transport,
        }
    }
}

/// A controller wired to a mock transport.
pub struct TestHarness {
    pub controller: ExchangeController,
    pub transport: Arc<MockTransport>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Runs one full turn through the controller.
    pub async fn send_message(&mut self, text: &str) -> TurnOutcome {
        self.controller.run_turn(text).await
    }

    /// The store contents as `(role, content)` pairs.
    pub fn transcript(&self) -> Vec<(Role, String)> {
        self.controller
            .store()
            .records()
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }
}
