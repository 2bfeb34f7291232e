//! The simulation loop.
//!
//! [`run_simulation`] drives a run turn by turn until one of the end
//! conditions holds:
//!
//! 1. **Converged**: at most one player has a positive balance.
//! 2. **Stopped**: the caller requested a stop through [`RunControl`].
//! 3. **Turn limit**: the configured turn cap was reached.
//!
//! The conditions are checked in that order before every turn, so a run
//! that has already converged reports convergence even if a stop request
//! arrived at the same moment.
//!
//! Each turn:
//!
//! 1. The selector draws two distinct eligible players.
//! 2. A fair coin decides the winner (heads pays the first player).
//! 3. One unit moves from the loser to the winner.
//! 4. The conservation law is verified (unless disabled).
//! 5. The sink receives a snapshot of the balances.

use chrono::Utc;
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, error, info, info_span, trace};

use cointoss_ledger::{BalanceSheet, ConservationResult, LedgerAnomaly, LedgerError, UnitTransfer};
use cointoss_types::{CoinSide, EndReason, GameOutcome, RunId, Snapshot, TradeRecord};

use crate::config::{RunConfig, SimulationConfig};
use crate::control::RunControl;
use crate::params::{GameError, GameParams};
use crate::select::{IndexedSelector, PlayerSelector, SelectionError};
use crate::sink::SnapshotSink;

/// Probability that the coin lands heads.
const FAIR_COIN: f64 = 0.5;

/// Errors that can end a run early.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The game inputs were rejected before any turn ran.
    #[error(transparent)]
    InvalidArgument(#[from] GameError),

    /// The balance sheet refused an operation.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The selector could not produce a pair.
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    /// The conservation check failed after a turn.
    #[error("{0}")]
    Conservation(Box<LedgerAnomaly>),

    /// The turn counter overflowed.
    #[error("turn counter overflow")]
    TurnOverflow,
}

impl EngineError {
    /// Returns `true` if the run was rejected for bad inputs.
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// Engine options that do not change the game itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Verify the conservation law after every turn.
    pub verify_conservation: bool,
}

impl RunOptions {
    /// Build from the `run` section of the configuration.
    pub const fn from_config(config: &RunConfig) -> Self {
        Self {
            verify_conservation: config.verify_conservation,
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            verify_conservation: true,
        }
    }
}

/// Build the run's random source: seeded when `seed` is given, otherwise
/// seeded from the operating system.
pub fn seeded_rng(seed: Option<u64>) -> SmallRng {
    seed.map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64)
}

/// Run one game to completion.
///
/// Every completed turn is reported to `sink` in order, followed by one
/// [`SnapshotSink::on_complete`] call. Inputs are validated before the
/// first turn, so an invalid game produces no snapshots.
///
/// # Errors
///
/// Returns [`EngineError`] if the sheet cannot be opened, the selector
/// fails, or the conservation check finds an anomaly. No completion
/// notification is sent in that case.
pub fn run_simulation<R: RngCore>(
    params: &GameParams,
    options: &RunOptions,
    rng: &mut R,
    selector: &mut dyn PlayerSelector,
    control: &RunControl,
    sink: &mut dyn SnapshotSink,
) -> Result<GameOutcome, EngineError> {
    let run_id = RunId::new();
    let span = info_span!("run", %run_id);
    let _guard = span.enter();

    let started_at = Utc::now();
    let mut sheet = BalanceSheet::new(params.player_count(), params.initial_balance())?;

    info!(
        players = params.player_count(),
        initial_balance = params.initial_balance(),
        total_wealth = sheet.total(),
        max_turns = control.max_turns(),
        "Run started"
    );

    let mut turns: u64 = 0;
    let end_reason = loop {
        if sheet.is_converged() {
            break EndReason::Converged;
        }
        if control.is_stop_requested() {
            info!(turns, "Stop requested");
            break EndReason::Stopped;
        }
        if control.turn_limit_reached(turns) {
            info!(turns, max_turns = control.max_turns(), "Turn limit reached");
            break EndReason::TurnLimitReached;
        }

        let (player1, player2) = selector.select_pair(&sheet, &mut *rng)?;
        let coin = CoinSide::from_bool(rng.random_bool(FAIR_COIN));
        turns = turns.checked_add(1).ok_or(EngineError::TurnOverflow)?;

        let trade = TradeRecord::new(turns, player1, player2, coin);
        let transfer = UnitTransfer::from_trade(&trade, sheet.player_count())?;
        sheet.apply(transfer)?;
        trace!(
            turn = turns,
            %player1,
            %player2,
            ?coin,
            winner = %trade.winner,
            "Trade settled"
        );

        if options.verify_conservation {
            if let ConservationResult::Anomaly(anomaly) = sheet.verify_conservation(turns) {
                error!(turn = turns, %anomaly, "Conservation check failed");
                return Err(EngineError::Conservation(Box::new(anomaly)));
            }
        }

        sink.on_snapshot(&Snapshot::new(run_id, turns, sheet.balances()), &trade);
    };

    let winner = if end_reason.is_converged() {
        sheet.sole_holder()
    } else {
        None
    };

    let outcome = GameOutcome {
        run_id,
        end_reason,
        turns,
        player_count: sheet.player_count(),
        total_wealth: sheet.total(),
        winner,
        final_balances: sheet.balances().to_vec(),
        started_at,
        finished_at: Utc::now(),
    };

    info!(
        turns,
        ?end_reason,
        winner = ?winner.map(|p| p.index()),
        remaining = sheet.eligible_count(),
        eliminated = sheet.zero_count(),
        "Run finished"
    );
    let last = Snapshot::new(run_id, turns, sheet.balances());
    debug!(balances = %last, holders = last.nonzero_count(), "Final balances");

    sink.on_complete(&outcome);
    Ok(outcome)
}

/// Run a game with default options: indexed selection, an OS-seeded random
/// source, no turn cap, and conservation checks on.
///
/// # Errors
///
/// Returns [`EngineError::InvalidArgument`] if `player_count` is not
/// positive or the total wealth overflows, and otherwise as
/// [`run_simulation`].
pub fn play(
    player_count: i64,
    initial_balance: i64,
    sink: &mut dyn SnapshotSink,
) -> Result<GameOutcome, EngineError> {
    let params = GameParams::new(player_count, initial_balance)?;
    let mut rng = seeded_rng(None);
    run_simulation(
        &params,
        &RunOptions::default(),
        &mut rng,
        &mut IndexedSelector,
        &RunControl::unbounded(),
        sink,
    )
}

/// Run the game described by a loaded configuration.
///
/// The selection strategy, seed, and options come from `config`; the turn
/// cap and stop flag come from `control`.
///
/// # Errors
///
/// As [`play`].
pub fn run_configured(
    config: &SimulationConfig,
    control: &RunControl,
    sink: &mut dyn SnapshotSink,
) -> Result<GameOutcome, EngineError> {
    let params = GameParams::from_config(&config.game)?;
    let mut selector = config
        .run
        .selection
        .build(config.run.max_selection_attempts);
    let mut rng = seeded_rng(config.game.seed);
    run_simulation(
        &params,
        &RunOptions::from_config(&config.run),
        &mut rng,
        selector.as_mut(),
        control,
        sink,
    )
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use crate::select::RejectionSelector;
    use crate::sink::{CollectingSink, NoOpSink};

    fn run_seeded(players: i64, balance: i64, seed: u64, sink: &mut dyn SnapshotSink) -> GameOutcome {
        let params = GameParams::new(players, balance).unwrap();
        run_simulation(
            &params,
            &RunOptions::default(),
            &mut seeded_rng(Some(seed)),
            &mut IndexedSelector,
            &RunControl::unbounded(),
            sink,
        )
        .unwrap()
    }

    #[test]
    fn two_players_converge() {
        let mut sink = CollectingSink::new();
        let outcome = run_seeded(2, 5, 7, &mut sink);

        assert_eq!(outcome.end_reason, EndReason::Converged);
        assert!(outcome.turns >= 5);
        assert_eq!(sink.snapshots.len(), usize::try_from(outcome.turns).unwrap());
        let last = sink.snapshots.last().unwrap();
        assert!(last == &vec![10, 0] || last == &vec![0, 10]);
        assert_eq!(outcome.final_balances, *last);
        assert_eq!(outcome.winner.map(|p| p.index()), last.iter().position(|&b| b == 10));
        assert_eq!(
            sink.completion.as_deref(),
            Some(format!("Game ends after {} turns.", outcome.turns).as_str())
        );
    }

    #[test]
    fn every_turn_moves_exactly_one_unit() {
        let mut sink = CollectingSink::new();
        run_seeded(4, 3, 11, &mut sink);

        let mut previous = vec![3_i64; 4];
        for (snapshot, trade) in sink.snapshots.iter().zip(&sink.trades) {
            assert_eq!(snapshot.iter().sum::<i64>(), 12);
            assert!(snapshot.iter().all(|&b| b >= 0));
            let changed: Vec<usize> = (0..4)
                .filter(|&i| snapshot.get(i) != previous.get(i))
                .collect();
            let mut expected = vec![trade.winner.index(), trade.loser.index()];
            expected.sort_unstable();
            assert_eq!(changed, expected);
            assert_eq!(
                snapshot.get(trade.winner.index()).copied(),
                previous.get(trade.winner.index()).map(|b| b + 1)
            );
            assert_eq!(
                snapshot.get(trade.loser.index()).copied(),
                previous.get(trade.loser.index()).map(|b| b - 1)
            );
            previous.clone_from(snapshot);
        }
    }

    #[test]
    fn degenerate_games_end_immediately() {
        for (players, balance) in [(1, 10), (5, 0), (3, -2)] {
            let mut sink = CollectingSink::new();
            let outcome = run_seeded(players, balance, 1, &mut sink);
            assert_eq!(outcome.turns, 0);
            assert_eq!(outcome.end_reason, EndReason::Converged);
            assert!(sink.snapshots.is_empty());
            assert_eq!(sink.completion.as_deref(), Some("Game ends after 0 turns."));
        }
    }

    #[test]
    fn single_player_is_the_winner() {
        let outcome = run_seeded(1, 10, 1, &mut NoOpSink);
        assert_eq!(outcome.winner.map(|p| p.index()), Some(0));
        assert_eq!(outcome.final_balances, vec![10]);
    }

    #[test]
    fn invalid_player_count_is_rejected_by_play() {
        let mut sink = CollectingSink::new();
        let err = play(0, 10, &mut sink).err().unwrap();
        assert!(err.is_invalid_argument());
        assert!(sink.snapshots.is_empty());
        assert!(sink.completion.is_none());
    }

    #[test]
    fn unallocatable_player_count_fails_without_snapshots() {
        let mut sink = CollectingSink::new();
        let err = play(1 << 61, 1, &mut sink).err().unwrap();
        assert!(matches!(
            err,
            EngineError::Ledger(LedgerError::Allocation { .. })
        ));
        assert!(sink.snapshots.is_empty());
        assert!(sink.completion.is_none());
    }

    #[test]
    fn same_seed_same_history() {
        let mut first = CollectingSink::new();
        let mut second = CollectingSink::new();
        run_seeded(6, 4, 42, &mut first);
        run_seeded(6, 4, 42, &mut second);
        assert_eq!(first.snapshots, second.snapshots);
    }

    #[test]
    fn turn_cap_halts_the_run() {
        let params = GameParams::new(10, 10).unwrap();
        let mut sink = CollectingSink::new();
        let outcome = run_simulation(
            &params,
            &RunOptions::default(),
            &mut seeded_rng(Some(3)),
            &mut IndexedSelector,
            &RunControl::new(25),
            &mut sink,
        )
        .unwrap();
        assert_eq!(outcome.end_reason, EndReason::TurnLimitReached);
        assert_eq!(outcome.turns, 25);
        assert_eq!(sink.snapshots.len(), 25);
        assert!(outcome.winner.is_none());
        assert_eq!(
            sink.completion.as_deref(),
            Some("Game halted at turn limit after 25 turns.")
        );
    }

    #[test]
    fn stop_before_start_runs_no_turns() {
        let params = GameParams::new(10, 10).unwrap();
        let control = RunControl::unbounded();
        control.request_stop();
        let mut sink = CollectingSink::new();
        let outcome = run_simulation(
            &params,
            &RunOptions::default(),
            &mut seeded_rng(Some(3)),
            &mut IndexedSelector,
            &control,
            &mut sink,
        )
        .unwrap();
        assert_eq!(outcome.end_reason, EndReason::Stopped);
        assert_eq!(outcome.turns, 0);
        assert_eq!(outcome.final_balances, vec![10; 10]);
        assert_eq!(sink.completion.as_deref(), Some("Game stopped after 0 turns."));
    }

    #[test]
    fn convergence_wins_over_stop() {
        let params = GameParams::new(1, 10).unwrap();
        let control = RunControl::unbounded();
        control.request_stop();
        let outcome = run_simulation(
            &params,
            &RunOptions::default(),
            &mut seeded_rng(Some(3)),
            &mut IndexedSelector,
            &control,
            &mut NoOpSink,
        )
        .unwrap();
        assert_eq!(outcome.end_reason, EndReason::Converged);
    }

    #[test]
    fn rejection_selector_reaches_the_same_endpoint() {
        let params = GameParams::new(5, 3).unwrap();
        let mut sink = CollectingSink::new();
        let outcome = run_simulation(
            &params,
            &RunOptions::default(),
            &mut seeded_rng(Some(9)),
            &mut RejectionSelector::default(),
            &RunControl::unbounded(),
            &mut sink,
        )
        .unwrap();
        assert_eq!(outcome.end_reason, EndReason::Converged);
        assert_eq!(outcome.final_balances.iter().sum::<i64>(), 15);
        assert_eq!(outcome.final_balances.iter().filter(|&&b| b != 0).count(), 1);
    }

    #[test]
    fn configured_run_uses_seed_and_cap() {
        let config = SimulationConfig::parse(
            "game:\n  player_count: 3\n  initial_balance: 4\n  seed: 5\nrun:\n  selection: rejection\n",
        )
        .unwrap();
        let mut first = CollectingSink::new();
        let mut second = CollectingSink::new();
        run_configured(&config, &RunControl::unbounded(), &mut first).unwrap();
        run_configured(&config, &RunControl::unbounded(), &mut second).unwrap();
        assert_eq!(first.snapshots, second.snapshots);

        let capped = run_configured(&config, &RunControl::new(2), &mut NoOpSink).unwrap();
        assert!(capped.turns <= 2);
    }

    #[test]
    fn outcome_serializes_for_callers() {
        let outcome = run_seeded(2, 1, 4, &mut NoOpSink);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["end_reason"], "converged");
        assert_eq!(json["turns"], 1);
        assert_eq!(json["total_wealth"], 2);
        assert_eq!(json["final_balances"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let mut a = seeded_rng(Some(17));
        let mut b = seeded_rng(Some(17));
        assert_eq!(a.next_u64(), b.next_u64());
    }
}
