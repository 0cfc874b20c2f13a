// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events flowing from a running turn back to the controller.

use palaver_core::{MessageId, ReplyEvent};

/// Identifies one submitted turn. Allocated in increasing order per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(pub u64);

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "turn-{}", self.0)
    }
}

/// A reply event tagged with the turn that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnEvent {
    pub turn: TurnId,
    pub kind: TurnEventKind,
}

impl TurnEvent {
    pub fn new(turn: TurnId, kind: TurnEventKind) -> Self {
        Self { turn, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEventKind {
    /// Incremental reply text.
    Chunk(String),
    /// Full reply in one piece.
    Complete(String),
    /// The reply finished; nothing more follows.
    Ended,
    /// The turn failed. Carries the error message for logging.
    Failed(String),
}

impl From<ReplyEvent> for TurnEventKind {
    fn from(event: ReplyEvent) -> Self {
        match event {
            ReplyEvent::Chunk(text) => TurnEventKind::Chunk(text),
            ReplyEvent::Complete(text) => TurnEventKind::Complete(text),
            ReplyEvent::End => TurnEventKind::Ended,
        }
    }
}

/// What [`apply`](crate::ExchangeController::apply) did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// Nothing changed.
    Ignored,
    /// A new assistant record was appended. `finished` is false while it is
    /// still receiving chunks.
    Appended { id: MessageId, finished: bool },
    /// The in-progress record grew.
    Extended { id: MessageId },
    /// The turn ended; the in-progress record, if any, is now frozen.
    Finished,
    /// The turn failed and the error placeholder record was appended.
    Failed { id: MessageId },
}

impl Reconciled {
    /// Whether this result closed the turn.
    pub fn ends_turn(&self) -> bool {
        matches!(
            self,
            Reconciled::Appended { finished: true, .. }
                | Reconciled::Finished
                | Reconciled::Failed { .. }
        )
    }
}

/// Result of driving one turn to completion with
/// [`run_turn`](crate::ExchangeController::run_turn).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The submission was refused (empty text or a turn already in flight).
    Rejected,
    /// The reply arrived. `reply` is `None` when the peer ended the turn
    /// without sending any text.
    Completed { reply: Option<MessageId> },
    /// The turn failed; `placeholder` is the error record that was appended.
    Failed { placeholder: MessageId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_events_map_onto_turn_events() {
        assert_eq!(
            TurnEventKind::from(ReplyEvent::Chunk("a".into())),
            TurnEventKind::Chunk("a".into())
        );
        assert_eq!(TurnEventKind::from(ReplyEvent::End), TurnEventKind::Ended);
    }

    #[test]
    fn only_terminal_results_end_the_turn() {
        let id = MessageId::new_v4();
        assert!(!Reconciled::Ignored.ends_turn());
        assert!(!Reconciled::Extended { id: id.clone() }.ends_turn());
        assert!(!Reconciled::Appended { id: id.clone(), finished: false }.ends_turn());
        assert!(Reconciled::Appended { id: id.clone(), finished: true }.ends_turn());
        assert!(Reconciled::Finished.ends_turn());
        assert!(Reconciled::Failed { id }.ends_turn());
    }

    #[test]
    fn turn_ids_display_with_prefix() {
        assert_eq!(TurnId(7).to_string(), "turn-7");
    }
}
