//! Simulation loop, player selection, and run control for the coin-toss
//! economy.
//!
//! A run starts every player with the same balance, then repeatedly picks
//! two distinct players with positive balance, flips a fair coin, and moves
//! one unit from the loser to the winner. It ends when at most one player
//! holds nonzero wealth.
//!
//! # Modules
//!
//! - [`params`] -- Validated game inputs and raw-input parsing.
//! - [`select`] -- [`PlayerSelector`] trait with indexed and rejection
//!   sampling strategies.
//! - [`control`] -- [`RunControl`]: stop flag and turn cap shared with the
//!   caller.
//! - [`sink`] -- [`SnapshotSink`] trait and the stock sinks.
//! - [`engine`] -- [`run_simulation`] and the [`play`] and [`run_configured`]
//!   shorthands.
//! - [`config`] -- Configuration loading from `cointoss-config.yaml`.
//!
//! [`PlayerSelector`]: select::PlayerSelector
//! [`RunControl`]: control::RunControl
//! [`SnapshotSink`]: sink::SnapshotSink
//! [`run_simulation`]: engine::run_simulation
//! [`play`]: engine::play

pub mod config;
pub mod control;
pub mod engine;
pub mod params;
pub mod select;
pub mod sink;

pub use config::SimulationConfig;
pub use control::RunControl;
pub use engine::{EngineError, RunOptions, play, run_configured, run_simulation, seeded_rng};
pub use params::{GameError, GameParams, parse_integer_input};
