//! Enumeration types for the coin-toss economy.

use serde::{Deserialize, Serialize};

/// Outcome of the fair coin flipped for every trade.
///
/// On [`CoinSide::Heads`] the first selected player wins the unit; on
/// [`CoinSide::Tails`] the second selected player wins it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinSide {
    /// First selected player gains one unit.
    Heads,
    /// Second selected player gains one unit.
    Tails,
}

impl CoinSide {
    /// Map a uniform random boolean to a coin side (`true` is heads).
    pub const fn from_bool(heads: bool) -> Self {
        if heads { Self::Heads } else { Self::Tails }
    }
}

/// Reason a simulation run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// At most one player holds nonzero wealth. The normal terminal state.
    Converged,
    /// The caller requested a stop before convergence.
    Stopped,
    /// The configured turn cap was reached before convergence.
    TurnLimitReached,
}

impl EndReason {
    /// Whether the run reached the natural terminal state.
    pub const fn is_converged(self) -> bool {
        matches!(self, Self::Converged)
    }
}
