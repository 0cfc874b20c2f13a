// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the chat endpoint.

use serde::{Deserialize, Serialize};

/// Request body: `{"message": "<user text>"}`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Response body. Fields other than `message` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: String,
}
