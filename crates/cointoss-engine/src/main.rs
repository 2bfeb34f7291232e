//! Command-line driver for the coin-toss economy.
//!
//! Runs one game and prints every player's balance after each turn, then
//! the completion message. Logs go to stderr; stdout carries only the
//! snapshot lines.
//!
//! # Startup Sequence
//!
//! 1. Read the command line
//! 2. Load configuration from `cointoss-config.yaml` (or defaults)
//! 3. Apply environment and command-line overrides
//! 4. Initialize structured logging (tracing)
//! 5. Install the Ctrl-C handler that requests a stop
//! 6. Run the simulation on a blocking thread
//! 7. Print the tail, if one was asked for, and log the result

mod args;
mod error;
mod output;

use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cointoss_core::config::{LogFormat, LoggingConfig, SimulationConfig};
use cointoss_core::sink::RecentLog;
use cointoss_core::{RunControl, parse_integer_input, run_configured};
use cointoss_types::GameOutcome;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::CliArgs;
use crate::error::AppError;
use crate::output::PrintSink;

/// Config file read when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "cointoss-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the arguments or configuration are invalid, the
/// simulation fails, or stdout cannot be written.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Read the command line.
    let cli = CliArgs::parse();

    // 2-3. Load configuration and apply overrides.
    let config = load_config(&cli).context("failed to prepare the run")?;

    // 4. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        players = config.game.player_count,
        initial_balance = config.game.initial_balance,
        seed = ?config.game.seed,
        max_turns = config.run.max_turns,
        selection = ?config.run.selection,
        tail = config.output.tail,
        "cointoss-engine starting"
    );

    // 5. Ctrl-C requests a stop before the next turn.
    let control = Arc::new(RunControl::from_config(&config.run));
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, stopping after the current turn");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }

    // 6-7. Run and report.
    let outcome = if config.output.tail > 0 {
        run_tail(config, control).await
    } else {
        run_streaming(config, control).await
    }
    .context("simulation did not complete")?;

    info!(
        run_id = %outcome.run_id,
        end_reason = ?outcome.end_reason,
        turns = outcome.turns,
        winner = ?outcome.winner.map(|p| p.index()),
        elapsed_ms = outcome
            .finished_at
            .signed_duration_since(outcome.started_at)
            .num_milliseconds(),
        "cointoss-engine shutdown complete"
    );
    Ok(())
}

/// Load the configuration file (if present) and apply overrides.
///
/// Precedence, lowest first: defaults, file, environment, command line.
fn load_config(cli: &CliArgs) -> Result<SimulationConfig, AppError> {
    let mut config = match cli.config.as_deref() {
        Some(path) => SimulationConfig::from_file(path)?,
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                SimulationConfig::from_file(path)?
            } else {
                let mut config = SimulationConfig::default();
                config.apply_env_overrides()?;
                config
            }
        }
    };

    if let Some(raw) = cli.players.as_deref() {
        config.game.player_count = parse_integer_input("player_count", raw)?;
    }
    if let Some(raw) = cli.balance.as_deref() {
        config.game.initial_balance = parse_integer_input("initial_balance", raw)?;
    }
    if let Some(seed) = cli.seed {
        config.game.seed = Some(seed);
    }
    if let Some(max_turns) = cli.max_turns {
        config.run.max_turns = max_turns;
    }
    if let Some(tail) = cli.tail {
        config.output.tail = tail;
    }
    Ok(config)
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true);
    match logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Stream every snapshot to stdout as it is produced.
async fn run_streaming(
    config: SimulationConfig,
    control: Arc<RunControl>,
) -> Result<GameOutcome, AppError> {
    let task = tokio::task::spawn_blocking(move || {
        let out = BufWriter::new(io::stdout());
        let mut sink = PrintSink::new(out, Arc::clone(&control));
        let result = run_configured(&config, &control, &mut sink);
        (result, sink.finish())
    });
    let (result, flushed) = task.await.map_err(|e| AppError::Task {
        message: e.to_string(),
    })?;
    let outcome = result?;
    flushed?;
    Ok(outcome)
}

/// Keep only the last `output.tail` lines and print them when the run ends.
async fn run_tail(
    config: SimulationConfig,
    control: Arc<RunControl>,
) -> Result<GameOutcome, AppError> {
    let capacity = config.output.tail;
    let task = tokio::task::spawn_blocking(move || {
        let mut log = RecentLog::new(capacity);
        let result = run_configured(&config, &control, &mut log);
        (result, log)
    });
    let (result, log) = task.await.map_err(|e| AppError::Task {
        message: e.to_string(),
    })?;
    let outcome = result?;

    let mut out = io::stdout().lock();
    for line in log.lines() {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(outcome)
}
