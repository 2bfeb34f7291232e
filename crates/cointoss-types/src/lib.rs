//! Shared type definitions for the coin-toss economy simulation.
//!
//! This crate is the single source of truth for the values that flow
//! between the ledger, the simulation loop, and whatever consumes its
//! output (the engine binary, tests, or an embedding application).
//!
//! # Modules
//!
//! - [`ids`] -- Player index and run identifier wrappers
//! - [`enums`] -- Coin sides and run end reasons
//! - [`structs`] -- Snapshots, trade records, and the final game outcome

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{CoinSide, EndReason};
pub use ids::{PlayerId, RunId};
pub use structs::{GameOutcome, Snapshot, TradeRecord, render_balances};
