//! Command-line arguments.
//!
//! Positional values are kept as raw strings: they go through the same
//! integer validation as config and environment values, so `12.0` is
//! accepted and `3.5` is not. Every argument overrides the config file.

use std::path::PathBuf;

use clap::Parser;

/// Coin-toss economy: prints every player's balance after each turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "cointoss-engine")]
#[command(version)]
#[command(allow_negative_numbers = true)]
pub struct CliArgs {
    /// Number of players (config default: 10)
    pub players: Option<String>,

    /// Starting balance of every player (config default: 10)
    pub balance: Option<String>,

    /// Config file (default: cointoss-config.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seed the random source for a reproducible run
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Halt after this many turns (0 = unlimited)
    #[arg(short, long)]
    pub max_turns: Option<u64>,

    /// Print only the last N lines instead of streaming every snapshot
    #[arg(short, long)]
    pub tail: Option<usize>,
}
