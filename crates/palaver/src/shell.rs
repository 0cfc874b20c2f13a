// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `palaver shell` command implementation.
//!
//! Interactive REPL with a coloured prompt, readline history, and replies
//! rendered as they arrive.

use std::sync::Arc;

use colored::Colorize;
use palaver_config::PalaverConfig;
use palaver_core::{HealthStatus, PalaverError, TransportAdapter};
use palaver_exchange::{ExchangeController, ExchangeOptions};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::render::Renderer;
use crate::transport::{ActiveTransport, mode_label};

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum ShellInput<'a> {
    Quit,
    History,
    Status,
    Unknown(&'a str),
    Message(&'a str),
    Blank,
}

fn parse_input(line: &str) -> ShellInput<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => ShellInput::Blank,
        "/quit" | "/exit" => ShellInput::Quit,
        "/history" => ShellInput::History,
        "/status" => ShellInput::Status,
        cmd if cmd.starts_with('/') && !cmd.contains(char::is_whitespace) => {
            ShellInput::Unknown(cmd)
        }
        _ => ShellInput::Message(line),
    }
}

/// Runs the `palaver shell` interactive REPL until `/quit`, Ctrl+C, or Ctrl+D.
pub async fn run_shell(config: PalaverConfig) -> Result<(), PalaverError> {
    let transport = Arc::new(ActiveTransport::connect(&config).await?);
    let kind = transport.kind();
    let mut controller = ExchangeController::new(transport, ExchangeOptions::from_config(&config));
    let mut renderer = Renderer::stdout();

    let mut rl = DefaultEditor::new()
        .map_err(|e| PalaverError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "palaver shell".bold().green());
    println!("Mode: {}", mode_label(kind));
    println!("Type {} to exit.\n", "/quit".yellow());

    let prompt = format!("{}> ", "you".cyan());
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };

        match parse_input(&line) {
            ShellInput::Blank => continue,
            ShellInput::Quit => break,
            ShellInput::History => {
                if let Err(e) = renderer.history(controller.store().records()) {
                    warn!(error = %e, "failed to write history");
                }
            }
            ShellInput::Status => print_status(&controller, &config).await,
            ShellInput::Unknown(cmd) => {
                eprintln!(
                    "{}: unknown command {cmd} (try /history, /status, /quit)",
                    "error".red()
                );
            }
            ShellInput::Message(text) => {
                let _ = rl.add_history_entry(text);
                controller.set_pending_input(text);
                run_pending_turn(&mut controller, &mut renderer).await;
            }
        }
    }

    controller.shutdown().await
}

/// Submits the pending input and renders events until the turn is over.
async fn run_pending_turn(
    controller: &mut ExchangeController,
    renderer: &mut Renderer<std::io::Stdout>,
) {
    if !controller.submit_pending() {
        return;
    }
    renderer.start_thinking();

    while controller.is_in_flight() {
        let Some(event) = controller.next_event().await else {
            debug!("event channel closed mid-turn");
            break;
        };
        let result = controller.apply(event);
        if let Err(e) = renderer.apply(controller.store(), &result) {
            warn!(error = %e, "failed to render reply");
        }
    }
}

async fn print_status(controller: &ExchangeController, config: &PalaverConfig) {
    let transport = controller.transport();
    let health = match transport.health_check().await {
        Ok(HealthStatus::Healthy) => "healthy".green(),
        Ok(HealthStatus::Degraded(reason)) => format!("degraded ({reason})").yellow(),
        Ok(HealthStatus::Unhealthy(reason)) => format!("unhealthy ({reason})").red(),
        Err(e) => format!("unknown ({e})").red(),
    };
    println!("Mode:     {}", mode_label(transport.kind()));
    println!("Endpoint: {}", config.active_endpoint());
    println!("Health:   {health}");
    println!("Status:   {}", controller.status());
    println!("Messages: {}", controller.store().len());
}
