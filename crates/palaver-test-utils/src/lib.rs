// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Palaver integration tests.
//!
//! Provides a mock transport, a local chat backend, and a harness for fast,
//! deterministic tests without external services.
//!
//! # Components
//!
//! - [`MockTransport`] - Transport with scripted per-turn replies
//! - [`TestBackend`] - axum server with an HTTP echo route and a scripted WebSocket route
//! - [`TestHarness`] - Controller wired to a mock transport

pub mod harness;
pub mod mock_transport;
pub mod test_backend;

pub use harness::TestHarness;
pub use mock_transport::{MockReply, MockTransport};
pub use test_backend::{TestBackend, WsAction, WsScript};
