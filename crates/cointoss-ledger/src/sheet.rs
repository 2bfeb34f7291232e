//! The balance sheet: the balance vector for one simulation run.
//!
//! The [`BalanceSheet`] owns every player's balance together with the
//! [`EligibleSet`] of players who can still trade, and exposes exactly one
//! mutation: [`BalanceSheet::transfer_unit`].
//!
//! # Design
//!
//! - **Closed system**: the total is fixed when the sheet is opened.
//! - **Unit moves**: every transfer moves exactly [`UNIT`].
//! - **No debt**: a player at zero cannot pay, so no balance goes negative
//!   once the sheet starts non-negative.
//! - **Eligibility tracking**: the eligible index is updated in the same
//!   call that changes a balance, so it never drifts from the vector.

use tracing::{debug, trace};

use cointoss_types::PlayerId;

use crate::conservation::{ConservationResult, verify_conservation};
use crate::eligible::EligibleSet;
use crate::transaction::UnitTransfer;
use crate::{LedgerError, UNIT, reserve_players};

/// Balance vector plus the index of eligible players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSheet {
    /// Balances, indexed by player.
    balances: Vec<i64>,
    /// Players with strictly positive balance.
    eligible: EligibleSet,
    /// `player_count * initial_balance`, fixed for the life of the sheet.
    total: i64,
}

impl BalanceSheet {
    /// Open a sheet with `player_count` players each holding `initial_balance`.
    ///
    /// Players with a non-positive starting balance are not eligible.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NoPlayers`] if `player_count` is zero,
    /// [`LedgerError::Overflow`] if the total wealth does not fit in `i64`,
    /// or [`LedgerError::Allocation`] if the sheet cannot be allocated.
    pub fn new(player_count: usize, initial_balance: i64) -> Result<Self, LedgerError> {
        if player_count == 0 {
            return Err(LedgerError::NoPlayers);
        }

        let count = i64::try_from(player_count).map_err(|_err| LedgerError::Overflow {
            context: "player count exceeds i64 range",
        })?;
        let total = count
            .checked_mul(initial_balance)
            .ok_or(LedgerError::Overflow {
                context: "total wealth exceeds i64 range",
            })?;

        let mut balances = Vec::new();
        reserve_players(&mut balances, player_count)?;
        balances.resize(player_count, initial_balance);

        let eligible = if initial_balance > 0 {
            EligibleSet::full(player_count)?
        } else {
            EligibleSet::new(player_count)?
        };

        Ok(Self {
            balances,
            eligible,
            total,
        })
    }

    /// Number of players on the sheet.
    pub const fn player_count(&self) -> usize {
        self.balances.len()
    }

    /// Current balances, indexed by player.
    pub fn balances(&self) -> &[i64] {
        &self.balances
    }

    /// Balance of a single player, if they exist.
    pub fn balance(&self, player: PlayerId) -> Option<i64> {
        self.balances.get(player.index()).copied()
    }

    /// The fixed total wealth of the sheet.
    pub const fn total(&self) -> i64 {
        self.total
    }

    /// Players currently eligible to trade.
    pub const fn eligible(&self) -> &EligibleSet {
        &self.eligible
    }

    /// Number of players currently eligible to trade.
    pub const fn eligible_count(&self) -> usize {
        self.eligible.len()
    }

    /// Number of players holding exactly zero.
    pub fn zero_count(&self) -> usize {
        self.balances.iter().filter(|&&balance| balance == 0).count()
    }

    /// Whether at most one player can still trade.
    pub const fn is_converged(&self) -> bool {
        self.eligible.len() <= 1
    }

    /// The single player holding nonzero wealth, if exactly one does.
    pub fn sole_holder(&self) -> Option<PlayerId> {
        let mut holders = self
            .balances
            .iter()
            .enumerate()
            .filter(|&(_, &balance)| balance != 0)
            .map(|(index, _)| PlayerId(index));
        let first = holders.next()?;
        if holders.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Move one unit from `payer` to `payee`.
    ///
    /// If the payer reaches zero they leave the eligible set; if the payee
    /// rises from zero they join it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownPlayer`] or [`LedgerError::SelfTransfer`]
    /// for an invalid pair, [`LedgerError::InsufficientBalance`] if the payer
    /// holds nothing, and [`LedgerError::Overflow`] if the payee's balance
    /// would overflow. The sheet is unchanged on error.
    pub fn transfer_unit(&mut self, payer: PlayerId, payee: PlayerId) -> Result<(), LedgerError> {
        let transfer = UnitTransfer::new(payer, payee, self.player_count())?;
        self.apply(transfer)
    }

    /// Apply a pre-validated [`UnitTransfer`].
    ///
    /// # Errors
    ///
    /// Same balance checks as [`BalanceSheet::transfer_unit`].
    pub fn apply(&mut self, transfer: UnitTransfer) -> Result<(), LedgerError> {
        let payer = transfer.payer();
        let payee = transfer.payee();

        let payer_balance = self.balance(payer).ok_or(LedgerError::UnknownPlayer {
            player: payer,
            player_count: self.player_count(),
        })?;
        let payee_balance = self.balance(payee).ok_or(LedgerError::UnknownPlayer {
            player: payee,
            player_count: self.player_count(),
        })?;

        if payer_balance < UNIT {
            return Err(LedgerError::InsufficientBalance {
                player: payer,
                balance: payer_balance,
            });
        }

        let new_payer = payer_balance
            .checked_sub(UNIT)
            .ok_or(LedgerError::Overflow {
                context: "payer balance underflow",
            })?;
        let new_payee = payee_balance
            .checked_add(UNIT)
            .ok_or(LedgerError::Overflow {
                context: "payee balance overflow",
            })?;

        self.set_balance(payer, new_payer);
        self.set_balance(payee, new_payee);
        trace!(%payer, %payee, new_payer, new_payee, "unit transferred");

        if new_payer == 0 && self.eligible.remove(payer) {
            debug!(
                player = %payer,
                remaining = self.eligible.len(),
                "player eliminated"
            );
        }
        if new_payee > 0 {
            self.eligible.insert(payee);
        }
        Ok(())
    }

    /// Verify the conservation law for the current state of the sheet.
    pub fn verify_conservation(&self, turn: u64) -> ConservationResult {
        verify_conservation(turn, &self.balances, self.total)
    }

    fn set_balance(&mut self, player: PlayerId, value: i64) {
        if let Some(slot) = self.balances.get_mut(player.index()) {
            *slot = value;
        }
    }
}
