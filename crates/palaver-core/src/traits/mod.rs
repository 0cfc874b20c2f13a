// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Transports use `#[async_trait]` so they can sit behind `Arc<dyn TransportAdapter>`.

pub mod transport;

pub use transport::{ReplyStream, TransportAdapter};
