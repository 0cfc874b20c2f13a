// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn orchestration for the Palaver chat client.
//!
//! [`ExchangeController`] appends the user's message, invokes the transport on
//! a background task, and reconciles the reply events into the message store,
//! whichever transport produced them.

pub mod controller;
pub mod event;

pub use controller::{ExchangeController, ExchangeOptions, Status};
pub use event::{Reconciled, TurnEvent, TurnEventKind, TurnId, TurnOutcome};
