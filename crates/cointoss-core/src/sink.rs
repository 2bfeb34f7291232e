//! Snapshot sinks: where the engine sends each turn's output.
//!
//! The engine calls [`SnapshotSink::on_snapshot`] once per completed turn,
//! synchronously and in turn order, then [`SnapshotSink::on_complete`] once
//! when the run ends. Snapshots borrow the live balance vector, so a sink
//! can render or copy them but never change them. Any history a caller
//! wants to keep is the sink's own state.

use std::collections::VecDeque;

use cointoss_types::{GameOutcome, Snapshot, TradeRecord, render_balances};

/// Number of lines [`RecentLog`] keeps by default.
pub const DEFAULT_LOG_CAPACITY: usize = 10;

/// Receiver of per-turn snapshots and the completion notification.
pub trait SnapshotSink {
    /// Called after every completed turn.
    fn on_snapshot(&mut self, snapshot: &Snapshot<'_>, trade: &TradeRecord);

    /// Called once after the last snapshot.
    fn on_complete(&mut self, _outcome: &GameOutcome) {}
}

impl<S: SnapshotSink + ?Sized> SnapshotSink for &mut S {
    fn on_snapshot(&mut self, snapshot: &Snapshot<'_>, trade: &TradeRecord) {
        (**self).on_snapshot(snapshot, trade);
    }

    fn on_complete(&mut self, outcome: &GameOutcome) {
        (**self).on_complete(outcome);
    }
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl SnapshotSink for NoOpSink {
    fn on_snapshot(&mut self, _snapshot: &Snapshot<'_>, _trade: &TradeRecord) {}
}

/// Adapts a line callback into a sink.
///
/// The callback receives each rendered snapshot (`"b0, b1, ..."`) and
/// finally the completion message.
pub struct LineSink<F> {
    callback: F,
}

impl<F: FnMut(&str)> LineSink<F> {
    /// Wrap `callback`.
    pub const fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: FnMut(&str)> SnapshotSink for LineSink<F> {
    fn on_snapshot(&mut self, snapshot: &Snapshot<'_>, _trade: &TradeRecord) {
        (self.callback)(&snapshot.to_string());
    }

    fn on_complete(&mut self, outcome: &GameOutcome) {
        (self.callback)(&outcome.completion_message());
    }
}

/// Keeps every snapshot, trade, and the completion message.
///
/// Memory grows with the run length; meant for tests and short runs.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    /// Balance vector after each turn.
    pub snapshots: Vec<Vec<i64>>,
    /// Trade applied on each turn.
    pub trades: Vec<TradeRecord>,
    /// Completion message, once the run has ended.
    pub completion: Option<String>,
}

impl CollectingSink {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every snapshot rendered as text, followed by the completion message.
    pub fn lines(&self) -> Vec<String> {
        self.snapshots
            .iter()
            .map(|balances| render_balances(balances))
            .chain(self.completion.iter().cloned())
            .collect()
    }
}

impl SnapshotSink for CollectingSink {
    fn on_snapshot(&mut self, snapshot: &Snapshot<'_>, trade: &TradeRecord) {
        self.snapshots.push(snapshot.balances.to_vec());
        self.trades.push(*trade);
    }

    fn on_complete(&mut self, outcome: &GameOutcome) {
        self.completion = Some(outcome.completion_message());
    }
}

/// Bounded log of the most recent rendered lines.
///
/// Holds at most `capacity` lines; older lines are dropped as new ones
/// arrive. The completion message counts as a line.
#[derive(Debug, Clone)]
pub struct RecentLog {
    capacity: usize,
    lines: VecDeque<String>,
    /// Total lines ever pushed, including dropped ones.
    seen: u64,
}

impl RecentLog {
    /// Create a log keeping the last `capacity` lines.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity),
            seen: 0,
        }
    }

    /// Maximum number of retained lines.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained lines, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Number of retained lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no lines are retained.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total lines pushed over the life of the log.
    pub const fn seen(&self) -> u64 {
        self.seen
    }

    /// Append a line, evicting the oldest if full.
    pub fn push(&mut self, line: String) {
        self.seen = self.seen.saturating_add(1);
        if self.capacity == 0 {
            return;
        }
        while self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }
}

impl Default for RecentLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl SnapshotSink for RecentLog {
    fn on_snapshot(&mut self, snapshot: &Snapshot<'_>, _trade: &TradeRecord) {
        self.push(snapshot.to_string());
    }

    fn on_complete(&mut self, outcome: &GameOutcome) {
        self.push(outcome.completion_message());
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use cointoss_types::{CoinSide, EndReason, PlayerId, RunId};

    use super::*;

    fn trade(turn: u64) -> TradeRecord {
        TradeRecord::new(turn, PlayerId(0), PlayerId(1), CoinSide::Heads)
    }

    fn outcome(turns: u64) -> GameOutcome {
        GameOutcome {
            run_id: RunId::new(),
            end_reason: EndReason::Converged,
            turns,
            player_count: 2,
            total_wealth: 4,
            winner: Some(PlayerId(0)),
            final_balances: vec![4, 0],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn line_sink_receives_rendered_lines() {
        let mut lines = Vec::new();
        {
            let mut sink = LineSink::new(|line: &str| lines.push(line.to_owned()));
            let run = RunId::new();
            sink.on_snapshot(&Snapshot::new(run, 1, &[3, 1]), &trade(1));
            sink.on_snapshot(&Snapshot::new(run, 2, &[4, 0]), &trade(2));
            sink.on_complete(&outcome(2));
        }
        assert_eq!(lines, vec!["3, 1", "4, 0", "Game ends after 2 turns."]);
    }

    #[test]
    fn collecting_sink_keeps_everything() {
        let mut sink = CollectingSink::new();
        let run = RunId::new();
        sink.on_snapshot(&Snapshot::new(run, 1, &[3, 1]), &trade(1));
        sink.on_complete(&outcome(1));
        assert_eq!(sink.snapshots, vec![vec![3, 1]]);
        assert_eq!(sink.trades.len(), 1);
        assert_eq!(sink.lines(), vec!["3, 1", "Game ends after 1 turns."]);
    }

    #[test]
    fn recent_log_keeps_last_lines() {
        let mut log = RecentLog::new(3);
        for n in 0..5 {
            log.push(format!("line {n}"));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.seen(), 5);
        assert_eq!(log.lines().collect::<Vec<_>>(), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn recent_log_default_capacity_is_ten() {
        let mut log = RecentLog::default();
        assert_eq!(log.capacity(), DEFAULT_LOG_CAPACITY);
        let run = RunId::new();
        for turn in 1..=25 {
            log.on_snapshot(&Snapshot::new(run, turn, &[1, 1]), &trade(turn));
        }
        log.on_complete(&outcome(25));
        assert_eq!(log.len(), 10);
        assert_eq!(log.lines().last(), Some("Game ends after 25 turns."));
    }

    #[test]
    fn zero_capacity_log_retains_nothing() {
        let mut log = RecentLog::new(0);
        log.push("dropped".to_owned());
        assert!(log.is_empty());
        assert_eq!(log.seen(), 1);
    }

    #[test]
    fn mutable_reference_is_a_sink() {
        fn feed(mut sink: impl SnapshotSink) {
            sink.on_snapshot(&Snapshot::new(RunId::new(), 1, &[2, 2]), &trade(1));
        }
        let mut collector = CollectingSink::new();
        feed(&mut collector);
        assert_eq!(collector.snapshots.len(), 1);
    }
}
