// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The exchange controller: owns the message store and the in-flight gate, and
//! folds transport events into the store one at a time.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use palaver_config::PalaverConfig;
use palaver_core::{MessageId, MessageStore, PalaverError, TransportAdapter, TransportKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::event::{Reconciled, TurnEvent, TurnEventKind, TurnId, TurnOutcome};

/// Capacity of the channel carrying turn events to the controller.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Whether a turn is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Ready to accept a submission.
    Idle,
    /// A turn is outstanding; submissions are refused.
    InFlight,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Idle => write!(f, "idle"),
            Status::InFlight => write!(f, "in-flight"),
        }
    }
}

/// Tunables for the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOptions {
    /// Content of the assistant record appended when a turn fails.
    pub error_placeholder: String,
    /// Deadline for a turn to reach a terminal event. `None` waits forever.
    pub turn_timeout: Option<Duration>,
}

impl Default for ExchangeOptions {
    fn default() -> Self {
        Self {
            error_placeholder: palaver_config::model::ClientConfig::default().error_placeholder,
            turn_timeout: None,
        }
    }
}

impl ExchangeOptions {
    /// Derives options from configuration. The turn deadline applies to the
    /// streaming transport only; request/response turns are bounded by the HTTP
    /// client timeout instead.
    pub fn from_config(config: &PalaverConfig) -> Self {
        let turn_timeout = match config.transport.kind {
            TransportKind::Streaming if config.streaming.turn_timeout_secs > 0 => {
                Some(Duration::from_secs(config.streaming.turn_timeout_secs))
            }
            _ => None,
        };
        Self {
            error_placeholder: config.client.error_placeholder.clone(),
            turn_timeout,
        }
    }
}

/// Orchestrates user turns against one transport.
///
/// The controller is the only writer of its [`MessageStore`]. Transport calls
/// run on spawned tasks and report back through a channel; the owner pulls
/// events with [`next_event`](Self::next_event) and folds them in with
/// [`apply`](Self::apply).
pub struct ExchangeController {
    transport: Arc<dyn TransportAdapter>,
    options: ExchangeOptions,
    store: MessageStore,
    status: Status,
    pending_input: String,
    current_turn: Option<TurnId>,
    /// Assistant record opened by the current turn's first chunk.
    turn_record: Option<MessageId>,
    next_turn: u64,
    events_tx: mpsc::Sender<TurnEvent>,
    events_rx: mpsc::Receiver<TurnEvent>,
}

impl ExchangeController {
    pub fn new(transport: Arc<dyn TransportAdapter>, options: ExchangeOptions) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            options,
            store: MessageStore::new(),
            status: Status::Idle,
            pending_input: String::new(),
            current_turn: None,
            turn_record: None,
            next_turn: 1,
            events_tx,
            events_rx,
        }
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_in_flight(&self) -> bool {
        self.status == Status::InFlight
    }

    /// The turn whose events are currently accepted.
    pub fn current_turn(&self) -> Option<TurnId> {
        self.current_turn
    }

    pub fn transport(&self) -> &Arc<dyn TransportAdapter> {
        &self.transport
    }

    pub fn options(&self) -> &ExchangeOptions {
        &self.options
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// Replaces the unsubmitted input text.
    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Submits the current pending input.
    pub fn submit_pending(&mut self) -> bool {
        let text = self.pending_input.clone();
        self.submit(&text)
    }

    /// Starts a turn with `text`.
    ///
    /// Refused (returning `false` and changing nothing) when `text` is blank or
    /// a turn is already in flight. Otherwise the user record is appended before
    /// the transport is invoked. Must be called from within a Tokio runtime.
    pub fn submit(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            debug!("empty submission ignored");
            return false;
        }
        if self.is_in_flight() {
            debug!("submission ignored while a turn is in flight");
            return false;
        }

        self.store.push_user(text);
        self.pending_input.clear();
        self.status = Status::InFlight;

        let turn = TurnId(self.next_turn);
        self.next_turn += 1;
        self.current_turn = Some(turn);
        self.turn_record = None;
        debug!(%turn, transport = self.transport.name(), "turn submitted");

        tokio::spawn(drive_turn(
            self.transport.clone(),
            text.to_owned(),
            turn,
            self.events_tx.clone(),
            self.options.turn_timeout,
        ));
        true
    }

    /// Waits for the next event from a running turn.
    ///
    /// The controller keeps its own sender alive, so this only returns `None`
    /// if that invariant is broken.
    pub async fn next_event(&mut self) -> Option<TurnEvent> {
        self.events_rx.recv().await
    }

    /// Folds one event into the store.
    ///
    /// Events are applied strictly in arrival order. Events that do not belong
    /// to the current turn are ignored.
    pub fn apply(&mut self, event: TurnEvent) -> Reconciled {
        if self.current_turn != Some(event.turn) {
            debug!(turn = %event.turn, kind = ?event.kind, "event for inactive turn ignored");
            return Reconciled::Ignored;
        }

        match event.kind {
            TurnEventKind::Chunk(text) => self.apply_chunk(text),
            TurnEventKind::Complete(text) => {
                let id = self.store.push_assistant(text);
                self.finish_turn();
                Reconciled::Appended { id, finished: true }
            }
            TurnEventKind::Ended => {
                self.store.finish_in_progress();
                self.finish_turn();
                Reconciled::Finished
            }
            TurnEventKind::Failed(message) => {
                warn!(turn = %event.turn, error = %message, "turn failed");
                let id = self.store.push_assistant(self.options.error_placeholder.clone());
                self.finish_turn();
                Reconciled::Failed { id }
            }
        }
    }

    fn apply_chunk(&mut self, text: String) -> Reconciled {
        if text.is_empty() {
            return Reconciled::Ignored;
        }

        if let Some(record) = &self.turn_record
            && self.store.in_progress() == Some(record)
            && let Some(id) = self.store.extend_in_progress(&text)
        {
            return Reconciled::Extended { id };
        }

        let id = self.store.begin_assistant(text);
        self.turn_record = Some(id.clone());
        Reconciled::Appended {
            id,
            finished: false,
        }
    }

    fn finish_turn(&mut self) {
        if let Some(turn) = self.current_turn.take() {
            debug!(%turn, "turn finished");
        }
        self.turn_record = None;
        self.status = Status::Idle;
    }

    /// Submits `text` and applies events until the turn is over.
    pub async fn run_turn(&mut self, text: &str) -> TurnOutcome {
        if !self.submit(text) {
            return TurnOutcome::Rejected;
        }

        let mut reply = None;
        while self.is_in_flight() {
            let Some(event) = self.next_event().await else {
                break;
            };
            match self.apply(event) {
                Reconciled::Appended { id, .. } => reply = Some(id),
                Reconciled::Failed { id } => return TurnOutcome::Failed { placeholder: id },
                Reconciled::Ignored | Reconciled::Extended { .. } | Reconciled::Finished => {}
            }
        }
        TurnOutcome::Completed { reply }
    }

    /// Releases the transport's resources.
    pub async fn shutdown(&self) -> Result<(), PalaverError> {
        info!(transport = self.transport.name(), "shutting down transport");
        self.transport.shutdown().await
    }
}

/// Runs one transport call, forwarding its events. Any failure, including a
/// missed deadline, is reported as a single [`TurnEventKind::Failed`].
async fn drive_turn(
    transport: Arc<dyn TransportAdapter>,
    text: String,
    turn: TurnId,
    events: mpsc::Sender<TurnEvent>,
    deadline: Option<Duration>,
) {
    let forwarding = forward_reply(transport.as_ref(), &text, turn, &events);
    let outcome = match deadline {
        Some(duration) => tokio::time::timeout(duration, forwarding)
            .await
            .unwrap_or(Err(PalaverError::Timeout { duration })),
        None => forwarding.await,
    };

    if let Err(e) = outcome {
        let _ = events
            .send(TurnEvent::new(turn, TurnEventKind::Failed(e.to_string())))
            .await;
    }
}

async fn forward_reply(
    transport: &dyn TransportAdapter,
    text: &str,
    turn: TurnId,
    events: &mpsc::Sender<TurnEvent>,
) -> Result<(), PalaverError> {
    let mut reply = transport.send(text).await?;

    while let Some(item) = reply.next().await {
        let event = item?;
        let terminal = event.is_terminal();
        if events
            .send(TurnEvent::new(turn, event.into()))
            .await
            .is_err()
        {
            debug!(%turn, "controller gone, abandoning turn");
            return Ok(());
        }
        if terminal {
            return Ok(());
        }
    }

    Err(PalaverError::Protocol {
        message: "reply stream ended without a terminal event".into(),
    })
}
