//! Snapshot, trade, and outcome structs.
//!
//! A [`Snapshot`] borrows the live balance vector for the duration of a
//! sink call, so consumers can render or copy it but never mutate it.
//! The [`GameOutcome`] is the owned summary handed back when a run ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{CoinSide, EndReason};
use crate::ids::{PlayerId, RunId};

/// Read-only view of the balance vector after a completed turn.
///
/// Renders as the balances joined by `", "` in player-index order, e.g.
/// `"11, 9, 10"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot<'a> {
    /// The run this snapshot belongs to.
    pub run_id: RunId,
    /// The turn that produced this snapshot (1-indexed).
    pub turn: u64,
    /// Current balances, indexed by player.
    pub balances: &'a [i64],
}

impl<'a> Snapshot<'a> {
    /// Create a snapshot view over a balance slice.
    pub const fn new(run_id: RunId, turn: u64, balances: &'a [i64]) -> Self {
        Self {
            run_id,
            turn,
            balances,
        }
    }

    /// Sum of all balances, or `None` on overflow.
    pub fn total(&self) -> Option<i64> {
        self.balances
            .iter()
            .try_fold(0_i64, |acc, &balance| acc.checked_add(balance))
    }

    /// Number of players holding a nonzero balance.
    pub fn nonzero_count(&self) -> usize {
        self.balances.iter().filter(|&&balance| balance != 0).count()
    }
}

impl core::fmt::Display for Snapshot<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write_balances(f, self.balances)
    }
}

/// Render a balance vector as `"b0, b1, ..."`.
pub fn render_balances(balances: &[i64]) -> String {
    struct Balances<'a>(&'a [i64]);

    impl core::fmt::Display for Balances<'_> {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            write_balances(f, self.0)
        }
    }

    Balances(balances).to_string()
}

fn write_balances(f: &mut core::fmt::Formatter<'_>, balances: &[i64]) -> core::fmt::Result {
    for (position, balance) in balances.iter().enumerate() {
        if position > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{balance}")?;
    }
    Ok(())
}

/// The single-unit trade applied during one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// The turn number (1-indexed).
    pub turn: u64,
    /// First selected player.
    pub player1: PlayerId,
    /// Second selected player (always distinct from `player1`).
    pub player2: PlayerId,
    /// The coin flip that decided the direction.
    pub coin: CoinSide,
    /// Player who gained the unit.
    pub winner: PlayerId,
    /// Player who paid the unit.
    pub loser: PlayerId,
}

impl TradeRecord {
    /// Build a record from the selected pair and the coin flip.
    ///
    /// Heads pays `player1`, tails pays `player2`.
    pub const fn new(turn: u64, player1: PlayerId, player2: PlayerId, coin: CoinSide) -> Self {
        let (winner, loser) = match coin {
            CoinSide::Heads => (player1, player2),
            CoinSide::Tails => (player2, player1),
        };
        Self {
            turn,
            player1,
            player2,
            coin,
            winner,
            loser,
        }
    }
}

/// Final result of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// The run identifier.
    pub run_id: RunId,
    /// Why the run stopped.
    pub end_reason: EndReason,
    /// Total number of turns executed.
    pub turns: u64,
    /// Number of players in the run.
    pub player_count: usize,
    /// Total wealth (`player_count * initial_balance`), constant for the run.
    pub total_wealth: i64,
    /// The only player holding nonzero wealth, if exactly one does.
    pub winner: Option<PlayerId>,
    /// Balances at the moment the run stopped.
    pub final_balances: Vec<i64>,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the run.
    pub finished_at: DateTime<Utc>,
}

impl GameOutcome {
    /// Human-readable completion message delivered after the last snapshot.
    pub fn completion_message(&self) -> String {
        self.to_string()
    }
}

impl core::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.end_reason {
            EndReason::Converged => write!(f, "Game ends after {} turns.", self.turns),
            EndReason::Stopped => write!(f, "Game stopped after {} turns.", self.turns),
            EndReason::TurnLimitReached => {
                write!(f, "Game halted at turn limit after {} turns.", self.turns)
            }
        }
    }
}
