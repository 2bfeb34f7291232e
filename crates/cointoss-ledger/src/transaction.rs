//! Validated single-unit transfers.
//!
//! A [`UnitTransfer`] names the paying and receiving players of one trade.
//! Construction checks that both players exist on the sheet and are
//! distinct; the balance check happens when the sheet applies it.

use cointoss_types::{PlayerId, TradeRecord};

use crate::LedgerError;

/// A one-unit wealth movement from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitTransfer {
    from: PlayerId,
    to: PlayerId,
}

impl UnitTransfer {
    /// Validate a transfer against a sheet of `player_count` players.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownPlayer`] if either player is out of
    /// range, or [`LedgerError::SelfTransfer`] if they are the same player.
    pub const fn new(
        from: PlayerId,
        to: PlayerId,
        player_count: usize,
    ) -> Result<Self, LedgerError> {
        if from.0 >= player_count {
            return Err(LedgerError::UnknownPlayer {
                player: from,
                player_count,
            });
        }
        if to.0 >= player_count {
            return Err(LedgerError::UnknownPlayer {
                player: to,
                player_count,
            });
        }
        if from.0 == to.0 {
            return Err(LedgerError::SelfTransfer(from));
        }
        Ok(Self { from, to })
    }

    /// Build the transfer described by a trade record (loser pays winner).
    ///
    /// # Errors
    ///
    /// Same as [`UnitTransfer::new`].
    pub const fn from_trade(trade: &TradeRecord, player_count: usize) -> Result<Self, LedgerError> {
        Self::new(trade.loser, trade.winner, player_count)
    }

    /// The paying player.
    pub const fn payer(&self) -> PlayerId {
        self.from
    }

    /// The receiving player.
    pub const fn payee(&self) -> PlayerId {
        self.to
    }
}
