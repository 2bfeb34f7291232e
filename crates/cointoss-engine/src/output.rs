//! Snapshot printing for the engine binary.

use std::io::{self, Write};
use std::sync::Arc;

use cointoss_core::RunControl;
use cointoss_core::sink::SnapshotSink;
use cointoss_types::{GameOutcome, Snapshot, TradeRecord};
use tracing::warn;

/// Streams each snapshot as a line to a writer.
///
/// The first write failure (a closed pipe, usually) requests a stop so the
/// run does not keep computing turns nobody will see. The error is kept
/// and returned by [`PrintSink::finish`].
pub struct PrintSink<W: Write> {
    out: W,
    control: Arc<RunControl>,
    failed: Option<io::Error>,
}

impl<W: Write> PrintSink<W> {
    /// Print to `out`, stopping the run through `control` on failure.
    pub const fn new(out: W, control: Arc<RunControl>) -> Self {
        Self {
            out,
            control,
            failed: None,
        }
    }

    /// Flush and report the first write error, if any.
    pub fn finish(mut self) -> io::Result<()> {
        if let Some(err) = self.failed.take() {
            return Err(err);
        }
        self.out.flush()
    }

    fn write_line(&mut self, line: &dyn std::fmt::Display) {
        if self.failed.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.out, "{line}") {
            warn!(error = %err, "stdout write failed, stopping run");
            self.control.request_stop();
            self.failed = Some(err);
        }
    }
}

impl<W: Write> SnapshotSink for PrintSink<W> {
    fn on_snapshot(&mut self, snapshot: &Snapshot<'_>, _trade: &TradeRecord) {
        self.write_line(snapshot);
    }

    fn on_complete(&mut self, outcome: &GameOutcome) {
        self.write_line(outcome);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cointoss_core::play;

    use super::*;

    /// A writer that accepts `budget` writes and then fails.
    struct Flaky {
        budget: usize,
        written: Vec<u8>,
    }

    impl Write for Flaky {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            self.budget = self.budget.saturating_sub(1);
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn prints_every_snapshot_and_the_completion() {
        let control = Arc::new(RunControl::unbounded());
        let mut sink = PrintSink::new(Vec::new(), Arc::clone(&control));
        let outcome = play(2, 3, &mut sink).unwrap();
        assert!(sink.failed.is_none());

        let text = String::from_utf8(sink.out.clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), usize::try_from(outcome.turns).unwrap().saturating_add(1));
        assert_eq!(lines.last().copied(), Some(outcome.to_string().as_str()));
        assert!(sink.finish().is_ok());
    }

    #[test]
    fn write_failure_requests_stop() {
        let control = Arc::new(RunControl::unbounded());
        let flaky = Flaky {
            budget: 0,
            written: Vec::new(),
        };
        let mut sink = PrintSink::new(flaky, Arc::clone(&control));
        let balances = [1, 1];
        let trade = TradeRecord::new(
            1,
            cointoss_types::PlayerId(0),
            cointoss_types::PlayerId(1),
            cointoss_types::CoinSide::Heads,
        );
        sink.on_snapshot(&Snapshot::new(cointoss_types::RunId::new(), 1, &balances), &trade);

        assert!(control.is_stop_requested());
        assert!(sink.out.written.is_empty());
        assert_eq!(
            sink.finish().err().map(|e| e.kind()),
            Some(io::ErrorKind::BrokenPipe)
        );
    }
}
