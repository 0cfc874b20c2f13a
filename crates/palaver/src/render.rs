// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-oriented rendering of the message store.
//!
//! Replies are printed as they grow: a streamed record is written chunk by
//! chunk on one line, and a "thinking" spinner covers the gap between
//! submission and the first reply text.

use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use palaver_core::{ChatMessage, MessageId, MessageStore, Role};
use palaver_exchange::Reconciled;

/// Prefix printed before each record, by role.
fn prefix(role: Role) -> String {
    match role {
        Role::User => format!("{}> ", "you".cyan()),
        Role::Assistant => format!("{}> ", "palaver".green()),
    }
}

/// Prints store changes to `out` as the controller applies events.
pub struct Renderer<W: Write> {
    out: W,
    spinner: Option<ProgressBar>,
    /// Open streamed record and how many bytes of it are already printed.
    open: Option<(MessageId, usize)>,
}

impl Renderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            spinner: None,
            open: None,
        }
    }

    /// Shows the thinking indicator. Hidden automatically when stderr is not a terminal.
    pub fn start_thinking(&mut self) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("thinking...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn stop_thinking(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Writes whatever `result` changed in `store`.
    pub fn apply(&mut self, store: &MessageStore, result: &Reconciled) -> io::Result<()> {
        match result {
            Reconciled::Ignored => {}
            Reconciled::Appended { id, finished } => {
                self.stop_thinking();
                self.close_open_line()?;
                let Some(record) = store.get(id) else {
                    return Ok(());
                };
                write!(self.out, "{}{}", prefix(record.role), record.content)?;
                if *finished {
                    writeln!(self.out)?;
                } else {
                    self.open = Some((id.clone(), record.content.len()));
                }
            }
            Reconciled::Extended { id } => {
                if let (Some((open_id, printed)), Some(record)) = (&mut self.open, store.get(id))
                    && *open_id == *id
                {
                    write!(self.out, "{}", &record.content[*printed..])?;
                    *printed = record.content.len();
                }
            }
            Reconciled::Finished => {
                self.stop_thinking();
                self.close_open_line()?;
            }
            Reconciled::Failed { id } => {
                self.stop_thinking();
                self.close_open_line()?;
                if let Some(record) = store.get(id) {
                    writeln!(self.out, "{}{}", prefix(record.role), record.content.red())?;
                }
            }
        }
        self.out.flush()
    }

    fn close_open_line(&mut self) -> io::Result<()> {
        if self.open.take().is_some() {
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Prints every record in order.
    pub fn history(&mut self, records: &[ChatMessage]) -> io::Result<()> {
        for record in records {
            writeln!(self.out, "{}{}", prefix(record.role), record.content)?;
        }
        self.out.flush()
    }

    /// Consumes the renderer, returning the writer.
    pub fn into_inner(mut self) -> W {
        self.stop_thinking();
        let Renderer { out, .. } = self;
        out
    }
}
