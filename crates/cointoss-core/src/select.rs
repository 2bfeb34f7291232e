//! Player selection strategies.
//!
//! Every turn the engine needs two distinct players with positive balance,
//! each drawn uniformly. The [`PlayerSelector`] trait abstracts how that
//! pair is drawn:
//!
//! - [`IndexedSelector`] draws directly from the sheet's eligible index.
//!   Constant time, never retries. The default.
//! - [`RejectionSelector`] samples the whole player range and rejects
//!   ineligible candidates, with a cap on attempts per draw. Its cost grows
//!   as players are eliminated.
//!
//! Both yield the same distribution over ordered pairs of distinct
//! eligible players.

use rand::{Rng, RngCore};
use serde::Deserialize;

use cointoss_ledger::BalanceSheet;
use cointoss_types::PlayerId;

/// Default per-draw attempt cap for [`RejectionSelector`].
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1_000_000;

/// Errors that can occur while selecting a pair of players.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// Fewer than two players can trade.
    #[error("need at least two eligible players, found {eligible}")]
    NotEnoughEligible {
        /// Number of eligible players at the time of the draw.
        eligible: usize,
    },

    /// Rejection sampling hit its attempt cap without finding a candidate.
    #[error("no eligible {role} found after {attempts} attempts")]
    AttemptsExhausted {
        /// Which draw failed (`"player1"` or `"player2"`).
        role: &'static str,
        /// The attempt cap that was hit.
        attempts: u32,
    },

    /// The eligible index returned no player for an in-range position.
    #[error("eligible index out of sync at position {position}")]
    IndexOutOfSync {
        /// The position that was looked up.
        position: usize,
    },
}

/// A strategy for drawing the two players of a trade.
pub trait PlayerSelector {
    /// Draw two distinct eligible players from `sheet`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] if fewer than two players are eligible or
    /// the strategy gives up.
    fn select_pair(
        &mut self,
        sheet: &BalanceSheet,
        rng: &mut dyn RngCore,
    ) -> Result<(PlayerId, PlayerId), SelectionError>;
}

/// Selection strategy named in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Draw from the eligible index.
    #[default]
    Indexed,
    /// Rejection-sample the full player range.
    Rejection,
}

impl SelectionStrategy {
    /// Build the selector for this strategy.
    pub fn build(self, max_attempts: u32) -> Box<dyn PlayerSelector + Send> {
        match self {
            Self::Indexed => Box::new(IndexedSelector),
            Self::Rejection => Box::new(RejectionSelector::new(max_attempts)),
        }
    }
}

fn require_two(sheet: &BalanceSheet) -> Result<usize, SelectionError> {
    let eligible = sheet.eligible_count();
    if eligible < 2 {
        return Err(SelectionError::NotEnoughEligible { eligible });
    }
    Ok(eligible)
}

// ---------------------------------------------------------------------------
// Indexed
// ---------------------------------------------------------------------------

/// Draws both players straight from the eligible index.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexedSelector;

impl PlayerSelector for IndexedSelector {
    fn select_pair(
        &mut self,
        sheet: &BalanceSheet,
        rng: &mut dyn RngCore,
    ) -> Result<(PlayerId, PlayerId), SelectionError> {
        let eligible = require_two(sheet)?;
        let index = sheet.eligible();

        let first = rng.random_range(0..eligible);
        // Draw the second from the remaining `eligible - 1` slots, skipping
        // over the first.
        let remaining = eligible.saturating_sub(1);
        let mut second = rng.random_range(0..remaining);
        if second >= first {
            second = second.saturating_add(1);
        }

        let player1 = index
            .get(first)
            .ok_or(SelectionError::IndexOutOfSync { position: first })?;
        let player2 = index
            .get(second)
            .ok_or(SelectionError::IndexOutOfSync { position: second })?;
        Ok((player1, player2))
    }
}

// ---------------------------------------------------------------------------
// Rejection
// ---------------------------------------------------------------------------

/// Samples `[0, player_count)` and rejects ineligible candidates.
#[derive(Debug, Clone, Copy)]
pub struct RejectionSelector {
    max_attempts: u32,
}

impl RejectionSelector {
    /// Create a selector giving up after `max_attempts` draws per player.
    ///
    /// A cap of zero is raised to one.
    pub const fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
        }
    }

    /// The per-draw attempt cap.
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn draw(
        &self,
        sheet: &BalanceSheet,
        rng: &mut dyn RngCore,
        role: &'static str,
        exclude: Option<PlayerId>,
    ) -> Result<PlayerId, SelectionError> {
        let player_count = sheet.player_count();
        for _ in 0..self.max_attempts {
            let candidate = PlayerId(rng.random_range(0..player_count));
            if Some(candidate) == exclude {
                continue;
            }
            if sheet.balance(candidate).is_some_and(|balance| balance > 0) {
                return Ok(candidate);
            }
        }
        Err(SelectionError::AttemptsExhausted {
            role,
            attempts: self.max_attempts,
        })
    }
}

impl Default for RejectionSelector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl PlayerSelector for RejectionSelector {
    fn select_pair(
        &mut self,
        sheet: &BalanceSheet,
        rng: &mut dyn RngCore,
    ) -> Result<(PlayerId, PlayerId), SelectionError> {
        require_two(sheet)?;
        let player1 = self.draw(sheet, rng, "player1", None)?;
        let player2 = self.draw(sheet, rng, "player2", Some(player1))?;
        Ok((player1, player2))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn drained_sheet() -> BalanceSheet {
        // 6 players, players 1 and 4 emptied.
        let mut sheet = BalanceSheet::new(6, 1).unwrap();
        sheet.transfer_unit(PlayerId(1), PlayerId(0)).unwrap();
        sheet.transfer_unit(PlayerId(4), PlayerId(5)).unwrap();
        sheet
    }

    fn check_pairs(selector: &mut dyn PlayerSelector) {
        let sheet = drained_sheet();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let (a, b) = selector.select_pair(&sheet, &mut rng).unwrap();
            assert_ne!(a, b);
            assert!(sheet.balance(a).unwrap() > 0);
            assert!(sheet.balance(b).unwrap() > 0);
        }
    }

    #[test]
    fn indexed_pairs_are_distinct_and_eligible() {
        check_pairs(&mut IndexedSelector);
    }

    #[test]
    fn rejection_pairs_are_distinct_and_eligible() {
        check_pairs(&mut RejectionSelector::default());
    }

    #[test]
    fn indexed_covers_every_eligible_player_in_both_roles() {
        let sheet = drained_sheet();
        let mut rng = SmallRng::seed_from_u64(99);
        let mut first_seen = [0_u32; 6];
        let mut second_seen = [0_u32; 6];
        for _ in 0..4_000 {
            let (a, b) = IndexedSelector.select_pair(&sheet, &mut rng).unwrap();
            if let Some(n) = first_seen.get_mut(a.index()) {
                *n = n.saturating_add(1);
            }
            if let Some(n) = second_seen.get_mut(b.index()) {
                *n = n.saturating_add(1);
            }
        }
        for player in [0, 2, 3, 5] {
            // Expected ~1000 each; a loose bound catches a skewed draw.
            assert!(first_seen[player] > 800, "player {player} as first: {first_seen:?}");
            assert!(second_seen[player] > 800, "player {player} as second: {second_seen:?}");
        }
        assert_eq!(first_seen[1], 0);
        assert_eq!(first_seen[4], 0);
        assert_eq!(second_seen[1], 0);
        assert_eq!(second_seen[4], 0);
    }

    #[test]
    fn fewer_than_two_eligible_is_an_error() {
        let mut sheet = BalanceSheet::new(2, 1).unwrap();
        sheet.transfer_unit(PlayerId(0), PlayerId(1)).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(
            IndexedSelector.select_pair(&sheet, &mut rng),
            Err(SelectionError::NotEnoughEligible { eligible: 1 })
        );
        assert_eq!(
            RejectionSelector::default().select_pair(&sheet, &mut rng),
            Err(SelectionError::NotEnoughEligible { eligible: 1 })
        );
    }

    #[test]
    fn rejection_cap_is_reported() {
        // 1000 players, only two eligible: a single attempt per draw will
        // almost surely miss.
        let mut sheet = BalanceSheet::new(1000, 1).unwrap();
        for payer in 2..1000 {
            sheet.transfer_unit(PlayerId(payer), PlayerId(0)).unwrap();
        }
        let mut selector = RejectionSelector::new(1);
        let mut rng = SmallRng::seed_from_u64(3);
        let mut exhausted = false;
        for _ in 0..50 {
            if let Err(err) = selector.select_pair(&sheet, &mut rng) {
                assert!(matches!(err, SelectionError::AttemptsExhausted { attempts: 1, .. }));
                exhausted = true;
                break;
            }
        }
        assert!(exhausted);
    }

    #[test]
    fn zero_cap_is_raised_to_one() {
        assert_eq!(RejectionSelector::new(0).max_attempts(), 1);
    }

    #[test]
    fn strategy_deserializes_and_builds() {
        let strategy: SelectionStrategy = serde_yml::from_str("rejection").unwrap();
        assert_eq!(strategy, SelectionStrategy::Rejection);
        assert_eq!(SelectionStrategy::default(), SelectionStrategy::Indexed);

        let sheet = BalanceSheet::new(3, 2).unwrap();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut selector = strategy.build(10_000);
        assert!(selector.select_pair(&sheet, &mut rng).is_ok());
    }
}
