//! Balance sheet and conservation checks for the coin-toss economy.
//!
//! Every unit of wealth in a run is tracked by a [`BalanceSheet`]. Wealth is
//! never created or destroyed after the sheet is opened: the only mutation
//! is a single-unit transfer between two distinct players, and a transfer
//! out of an empty balance is rejected. The conservation law is verified
//! after every turn by the simulation loop.
//!
//! # Architecture
//!
//! - [`sheet`] -- The [`BalanceSheet`]: balance vector plus eligible index.
//! - [`eligible`] -- The [`EligibleSet`]: O(1) membership, removal, and
//!   positional lookup of players with positive balance.
//! - [`transaction`] -- The validated [`UnitTransfer`].
//! - [`conservation`] -- Conservation law verification and anomaly reporting.
//!
//! # Conservation Law
//!
//! For every turn T:
//!
//! ```text
//! sum(balances after T) == player_count * initial_balance
//! every balance after T >= 0
//! ```
//!
//! A violation produces a [`LedgerAnomaly`]. The ledger never panics; it
//! returns errors.
//!
//! # Usage
//!
//! ```
//! use cointoss_ledger::{BalanceSheet, ConservationResult};
//! use cointoss_types::PlayerId;
//!
//! let mut sheet = BalanceSheet::new(3, 2).ok();
//! if let Some(sheet) = sheet.as_mut() {
//!     sheet.transfer_unit(PlayerId(0), PlayerId(1)).ok();
//!     assert_eq!(sheet.balances(), &[1, 3, 2]);
//!     assert_eq!(sheet.verify_conservation(1), ConservationResult::Balanced);
//! }
//! ```

pub mod conservation;
pub mod eligible;
pub mod sheet;
pub mod transaction;

// Re-export primary types at crate root.
pub use conservation::ConservationResult;
pub use eligible::EligibleSet;
pub use sheet::BalanceSheet;
pub use transaction::UnitTransfer;

use cointoss_types::PlayerId;

/// The fixed magnitude of every trade.
///
/// Pinned to one unit: the termination argument for the simulation relies
/// on balances moving by exactly one, so that no balance can skip past zero.
pub const UNIT: i64 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when opening a sheet or recording a transfer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A sheet must have at least one player.
    #[error("balance sheet needs at least one player")]
    NoPlayers,

    /// The referenced player is outside the balance vector.
    #[error("unknown player {player}: sheet has {player_count} players")]
    UnknownPlayer {
        /// The invalid player index.
        player: PlayerId,
        /// Number of players on the sheet.
        player_count: usize,
    },

    /// A transfer must move wealth between two distinct players.
    #[error("player {0} cannot trade with themselves")]
    SelfTransfer(PlayerId),

    /// The paying player has no wealth left to give.
    #[error("player {player} cannot pay one unit from balance {balance}")]
    InsufficientBalance {
        /// The paying player.
        player: PlayerId,
        /// Their balance at the time of the transfer.
        balance: i64,
    },

    /// The balance vector or eligible index for this many players cannot
    /// be allocated.
    #[error("cannot allocate a sheet for {player_count} players")]
    Allocation {
        /// The requested number of players.
        player_count: usize,
    },

    /// A balance or the sheet total does not fit in an `i64`.
    #[error("arithmetic overflow: {context}")]
    Overflow {
        /// Description of what was being computed.
        context: &'static str,
    },
}

/// Reserve room for exactly `player_count` entries without aborting on a
/// capacity overflow or allocation failure.
pub(crate) fn reserve_players<T>(vec: &mut Vec<T>, player_count: usize) -> Result<(), LedgerError> {
    vec.try_reserve_exact(player_count)
        .map_err(|_err| LedgerError::Allocation { player_count })
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation law violation detected after a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// The turn after which the anomaly was detected.
    pub turn: u64,
    /// The total the sheet was opened with.
    pub expected_total: i64,
    /// The observed total, or `None` if summation overflowed.
    pub actual_total: Option<i64>,
    /// Players whose balance went negative.
    pub negative_players: Vec<PlayerId>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
