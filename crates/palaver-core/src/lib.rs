// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Palaver chat client.
//!
//! This crate provides the message store, the error type, the shared types,
//! and the [`TransportAdapter`] trait that both wire protocols implement.

pub mod error;
pub mod sentinel;
pub mod store;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PalaverError;
pub use store::MessageStore;
pub use traits::{ReplyStream, TransportAdapter};
pub use types::{ChatMessage, HealthStatus, MessageId, ReplyEvent, Role, TransportKind};
