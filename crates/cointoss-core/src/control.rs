//! Run control shared between the engine and its caller.
//!
//! The engine checks [`RunControl`] at the top of every turn. The caller
//! (or another thread, e.g. a Ctrl-C handler) can request a stop at any
//! time, and a turn cap bounds the worst-case length of a run.
//!
//! The stop flag is an [`AtomicBool`] so the control can sit in an `Arc`
//! shared across threads without locking on the turn loop.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use crate::config::RunConfig;

/// Stop flag and turn cap for a simulation run.
#[derive(Debug)]
pub struct RunControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Maximum number of turns (0 = unlimited).
    max_turns: u64,

    /// Wall-clock time the control was created.
    started_at: DateTime<Utc>,
}

impl RunControl {
    /// Create a control with the given turn cap (0 = unlimited).
    pub fn new(max_turns: u64) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            max_turns,
            started_at: Utc::now(),
        }
    }

    /// Create a control with no turn cap.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Create a control from the `run` section of the configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.max_turns)
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request that the run stop before its next turn.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// The configured turn cap (0 = unlimited).
    pub const fn max_turns(&self) -> u64 {
        self.max_turns
    }

    /// Returns `true` if `max_turns > 0` and `turns >= max_turns`.
    pub const fn turn_limit_reached(&self, turns: u64) -> bool {
        self.max_turns > 0 && turns >= self.max_turns
    }

    /// Wall-clock time the control was created.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole seconds elapsed since the control was created.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        // Negative if the wall clock stepped backwards; treat as 0.
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn unbounded_never_hits_limit() {
        let control = RunControl::unbounded();
        assert_eq!(control.max_turns(), 0);
        assert!(!control.turn_limit_reached(0));
        assert!(!control.turn_limit_reached(u64::MAX));
    }

    #[test]
    fn limit_reached_at_cap() {
        let control = RunControl::new(5);
        assert!(!control.turn_limit_reached(4));
        assert!(control.turn_limit_reached(5));
        assert!(control.turn_limit_reached(6));
    }

    #[test]
    fn stop_is_visible_across_threads() {
        let control = Arc::new(RunControl::default());
        assert!(!control.is_stop_requested());

        let remote = Arc::clone(&control);
        let handle = std::thread::spawn(move || remote.request_stop());
        assert!(handle.join().is_ok());

        assert!(control.is_stop_requested());
    }

    #[test]
    fn elapsed_starts_near_zero() {
        let control = RunControl::new(1);
        assert!(control.elapsed_seconds() < 5);
        assert!(control.started_at() <= Utc::now());
    }
}
