// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Palaver - a terminal chat client.
//!
//! This is the binary entry point. Replies arrive either as one JSON body per
//! turn (HTTP) or as text chunks over a persistent WebSocket.

mod render;
mod shell;
mod transport;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use palaver_config::{ConfigError, PalaverConfig};
use palaver_core::{HealthStatus, MessageStore, PalaverError, TransportAdapter, TransportKind};
use palaver_exchange::{ExchangeController, ExchangeOptions, TurnOutcome};

use crate::transport::{ActiveTransport, mode_label};

/// Palaver - a terminal chat client.
#[derive(Parser, Debug)]
#[command(name = "palaver", version, about, long_about = None)]
struct Cli {
    /// Load this config file instead of the default hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Transport to use (overrides `transport.kind`).
    #[arg(long, global = true, value_name = "request-response|streaming")]
    transport: Option<TransportKind>,

    /// Endpoint for the selected transport.
    #[arg(long, global = true, value_name = "URL")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Launch an interactive chat session (default).
    Shell,
    /// Send one message and print the reply.
    Send {
        /// Message text; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Print the effective configuration as TOML.
    Config,
    /// Check the selected transport's health.
    Check,
}

/// Crates whose events follow `client.log_level`.
const LOG_TARGETS: &[&str] = &[
    "palaver",
    "palaver_core",
    "palaver_config",
    "palaver_exchange",
    "palaver_http",
    "palaver_ws",
];

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(errors) => {
            palaver_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.client.log_level);

    let result = match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => shell::run_shell(config).await.map(|()| ExitCode::SUCCESS),
        Commands::Send { text } => run_send(config, &text.join(" ")).await,
        Commands::Config => print_config(&config).map(|()| ExitCode::SUCCESS),
        Commands::Check => run_check(config).await,
    };

    result.unwrap_or_else(|e| {
        eprintln!("{}: {e}", "error".red());
        ExitCode::FAILURE
    })
}

/// Loads config from `--config` or the hierarchy, then applies flag overrides.
fn load_config(cli: &Cli) -> Result<PalaverConfig, Vec<ConfigError>> {
    let mut config = match &cli.config {
        Some(path) => palaver_config::load_and_validate_from(path)?,
        None => palaver_config::load_and_validate()?,
    };
    if apply_overrides(&mut config, cli.transport, cli.endpoint.as_deref()) {
        palaver_config::validation::validate_config(&config)?;
    }
    Ok(config)
}

/// Returns true if anything changed.
fn apply_overrides(
    config: &mut PalaverConfig,
    transport: Option<TransportKind>,
    endpoint: Option<&str>,
) -> bool {
    let mut changed = false;
    if let Some(kind) = transport {
        config.transport.kind = kind;
        changed = true;
    }
    if let Some(endpoint) = endpoint {
        config.set_active_endpoint(endpoint);
        changed = true;
    }
    changed
}

fn log_filter(log_level: &str) -> String {
    let level = log_level.to_ascii_lowercase();
    let mut directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Installs the global subscriber on stderr so logs never interleave with replies.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn controller_for(transport: ActiveTransport, config: &PalaverConfig) -> ExchangeController {
    ExchangeController::new(Arc::new(transport), ExchangeOptions::from_config(config))
}

/// What a one-shot turn produced.
#[derive(Debug, PartialEq, Eq)]
enum SendReport {
    /// The reply text, if the peer sent any.
    Reply(Option<String>),
    /// The placeholder shown for a failed turn.
    Failed(String),
}

fn blank_message() -> PalaverError {
    PalaverError::Internal("nothing to send: message text is blank".into())
}

fn send_report(
    store: &MessageStore,
    outcome: TurnOutcome,
    fallback: &str,
) -> Result<SendReport, PalaverError> {
    match outcome {
        TurnOutcome::Rejected => Err(blank_message()),
        TurnOutcome::Completed { reply } => Ok(SendReport::Reply(
            reply
                .and_then(|id| store.get(&id))
                .map(|r| r.content.clone()),
        )),
        TurnOutcome::Failed { placeholder } => Ok(SendReport::Failed(
            store
                .get(&placeholder)
                .map_or_else(|| fallback.to_string(), |r| r.content.clone()),
        )),
    }
}

/// `palaver send`: one turn, reply on stdout, placeholder on stderr.
async fn run_send(config: PalaverConfig, text: &str) -> Result<ExitCode, PalaverError> {
    if text.trim().is_empty() {
        return Err(blank_message());
    }
    let transport = ActiveTransport::connect(&config).await?;
    let mut controller = controller_for(transport, &config);

    let outcome = controller.run_turn(text).await;
    let _ = controller.shutdown().await;

    match send_report(controller.store(), outcome, &config.client.error_placeholder)? {
        SendReport::Reply(reply) => {
            if let Some(reply) = reply {
                println!("{reply}");
            }
            Ok(ExitCode::SUCCESS)
        }
        SendReport::Failed(placeholder) => {
            eprintln!("{}", placeholder.red());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_config(config: &PalaverConfig) -> Result<(), PalaverError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| PalaverError::Internal(format!("failed to serialize config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// `palaver check`: fails when the transport is unhealthy or cannot connect.
async fn run_check(config: PalaverConfig) -> Result<ExitCode, PalaverError> {
    let transport = ActiveTransport::connect(&config).await?;
    let health = transport.health_check().await;
    let _ = transport.shutdown().await;

    let label = mode_label(config.transport.kind);
    let endpoint = config.active_endpoint();
    match health? {
        HealthStatus::Healthy => {
            println!("{label} {endpoint}: {}", "healthy".green());
            Ok(ExitCode::SUCCESS)
        }
        HealthStatus::Degraded(reason) => {
            println!("{label} {endpoint}: {} ({reason})", "degraded".yellow());
            Ok(ExitCode::SUCCESS)
        }
        HealthStatus::Unhealthy(reason) => {
            println!("{label} {endpoint}: {} ({reason})", "unhealthy".red());
            Ok(ExitCode::FAILURE)
        }
    }
}
