//! Conservation law verification for the balance sheet.
//!
//! Wealth only moves between players, one unit at a time, so after every
//! turn the balances must still sum to the total the sheet was opened
//! with, and no balance may be negative. Both hold by construction when
//! transfers go through [`BalanceSheet::transfer_unit`]; the check exists
//! to catch corruption or a future change to the transfer rules.
//!
//! [`BalanceSheet::transfer_unit`]: crate::BalanceSheet::transfer_unit

use cointoss_types::PlayerId;

use crate::LedgerAnomaly;

/// The result of a conservation check after a single turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Total matches and every balance is non-negative.
    Balanced,
    /// The total drifted or a balance went negative.
    Anomaly(LedgerAnomaly),
}

impl ConservationResult {
    /// Whether the check passed.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Verify the conservation law for `balances` after `turn`.
///
/// Negative balances are only reported when `expected_total` is
/// non-negative: a sheet opened with a negative starting balance never
/// trades, so its negative entries are the starting state rather than
/// a violation.
pub fn verify_conservation(turn: u64, balances: &[i64], expected_total: i64) -> ConservationResult {
    let actual_total = balances
        .iter()
        .try_fold(0_i64, |acc, &balance| acc.checked_add(balance));

    let negative_players: Vec<PlayerId> = if expected_total >= 0 {
        balances
            .iter()
            .enumerate()
            .filter(|&(_, &balance)| balance < 0)
            .map(|(index, _)| PlayerId(index))
            .collect()
    } else {
        Vec::new()
    };

    let total_matches = actual_total == Some(expected_total);
    if total_matches && negative_players.is_empty() {
        return ConservationResult::Balanced;
    }

    let message = match actual_total {
        None => format!("LEDGER_ANOMALY after turn {turn}: arithmetic overflow while summing balances"),
        Some(actual) if actual != expected_total => format!(
            "LEDGER_ANOMALY after turn {turn}: total wealth {actual} != expected {expected_total}",
        ),
        Some(_) => format!(
            "LEDGER_ANOMALY after turn {turn}: {} player(s) with negative balance",
            negative_players.len(),
        ),
    };

    ConservationResult::Anomaly(LedgerAnomaly {
        turn,
        expected_total,
        actual_total,
        negative_players,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_start_is_balanced() {
        assert_eq!(verify_conservation(0, &[10, 10, 10], 30), ConservationResult::Balanced);
    }

    #[test]
    fn converged_sheet_is_balanced() {
        assert!(verify_conservation(77, &[0, 0, 30], 30).is_balanced());
    }

    #[test]
    fn drifted_total_is_anomaly() {
        let result = verify_conservation(4, &[10, 11, 10], 30);
        assert!(!result.is_balanced());
        if let ConservationResult::Anomaly(anomaly) = result {
            assert_eq!(anomaly.turn, 4);
            assert_eq!(anomaly.actual_total, Some(31));
            assert!(anomaly.message.contains("LEDGER_ANOMALY"));
            assert!(anomaly.message.contains("31"));
        }
    }

    #[test]
    fn negative_balance_is_anomaly_even_when_total_matches() {
        let result = verify_conservation(9, &[-1, 16, 15], 30);
        assert!(!result.is_balanced());
        if let ConservationResult::Anomaly(anomaly) = result {
            assert_eq!(anomaly.negative_players, vec![PlayerId(0)]);
            assert_eq!(anomaly.actual_total, Some(30));
            assert!(anomaly.message.contains("negative"));
        }
    }

    #[test]
    fn negative_start_is_not_an_anomaly() {
        assert!(verify_conservation(0, &[-3, -3], -6).is_balanced());
    }

    #[test]
    fn overflow_is_anomaly() {
        let result = verify_conservation(1, &[i64::MAX, 1], 0);
        assert!(!result.is_balanced());
        if let ConservationResult::Anomaly(anomaly) = result {
            assert_eq!(anomaly.actual_total, None);
            assert!(anomaly.message.contains("overflow"));
        }
    }

    #[test]
    fn anomaly_display_shows_message() {
        let anomaly = LedgerAnomaly {
            turn: 5,
            expected_total: 10,
            actual_total: Some(9),
            negative_players: Vec::new(),
            message: "LEDGER_ANOMALY after turn 5: test display".to_owned(),
        };
        let display = format!("{anomaly}");
        assert!(display.contains("LEDGER_ANOMALY"));
        assert!(display.contains("turn 5"));
    }
}
