//! Save cycle bookkeeping
//!
//! ```text
//! idle --(save begins)--> saving --(success)--> saved --(display window)--> idle
//!                           \--(failure)--> error (until the next attempt)
//! ```
//!
//! Cycles are numbered from 1. The in-flight record, not the status, is what
//! keeps two persistence calls from overlapping.

use crate::status::{SaveState, SaveStatus};
use chrono::{DateTime, Utc};
use draftsave_core::Snapshot;

/// Result of asking for a save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Begin {
    /// A new cycle started; the caller must run it
    Started(u64),
    /// The in-flight cycle already carries this value
    Joined(u64),
    /// A follow-up cycle will run once the in-flight one finishes
    Queued(u64),
}

impl Begin {
    /// Cycle whose completion covers the request
    pub(crate) fn cycle(self) -> u64 {
        match self {
            Begin::Started(cycle) | Begin::Joined(cycle) | Begin::Queued(cycle) => cycle,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    cycle: u64,
    snapshot: Snapshot,
}

#[derive(Debug, Default)]
pub(crate) struct Executor {
    state: SaveState,
    in_flight: Option<InFlight>,
    follow_up: bool,
    last_cycle: u64,
    last_success: u64,
}

impl Executor {
    pub(crate) fn state(&self) -> &SaveState {
        &self.state
    }

    /// Request a save of the value identified by `snapshot`
    pub(crate) fn begin(&mut self, snapshot: Snapshot) -> Begin {
        if let Some(flight) = self.in_flight {
            if flight.snapshot == snapshot {
                return Begin::Joined(flight.cycle);
            }
            self.follow_up = true;
            return Begin::Queued(flight.cycle + 1);
        }

        self.last_cycle += 1;
        self.in_flight = Some(InFlight {
            cycle: self.last_cycle,
            snapshot,
        });
        self.state.status = SaveStatus::Saving;
        self.state.error = None;
        Begin::Started(self.last_cycle)
    }

    /// Record the outcome of `cycle`
    ///
    /// Returns true when a follow-up save was requested meanwhile.
    pub(crate) fn finish(&mut self, cycle: u64, outcome: Result<DateTime<Utc>, String>) -> bool {
        debug_assert_eq!(self.in_flight.map(|f| f.cycle), Some(cycle));
        self.in_flight = None;

        match outcome {
            Ok(saved_at) => {
                self.state.status = SaveStatus::Saved;
                self.state.last_saved = Some(saved_at);
                self.last_success = cycle;
            }
            Err(message) => {
                self.state.status = SaveStatus::Error;
                self.state.error = Some(message).filter(|m| !m.trim().is_empty());
            }
        }

        std::mem::take(&mut self.follow_up)
    }

    /// End the display window opened by a successful `cycle`
    ///
    /// Has no effect once a newer cycle changed the status.
    pub(crate) fn expire_saved(&mut self, cycle: u64) -> bool {
        if self.state.status == SaveStatus::Saved && self.last_success == cycle {
            self.state.status = SaveStatus::Idle;
            true
        } else {
            false
        }
    }

    pub(crate) fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Cycle a waiter must see complete to cover everything requested so far
    pub(crate) fn pending_target(&self) -> Option<u64> {
        self.in_flight
            .map(|flight| flight.cycle + u64::from(self.follow_up))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(v: u8) -> Snapshot {
        Snapshot::from_bytes(&[v])
    }

    #[test]
    fn test_success_path() {
        let mut exec = Executor::default();
        assert_eq!(exec.state().status, SaveStatus::Idle);

        assert_eq!(exec.begin(snap(1)), Begin::Started(1));
        assert_eq!(exec.state().status, SaveStatus::Saving);
        assert!(exec.is_saving());

        let now = Utc::now();
        assert!(!exec.finish(1, Ok(now)));
        assert_eq!(exec.state().status, SaveStatus::Saved);
        assert_eq!(exec.state().last_saved, Some(now));

        assert!(exec.expire_saved(1));
        assert_eq!(exec.state().status, SaveStatus::Idle);
    }

    #[test]
    fn test_same_value_joins_in_flight_cycle() {
        let mut exec = Executor::default();
        exec.begin(snap(1));
        assert_eq!(exec.begin(snap(1)), Begin::Joined(1));
        assert_eq!(exec.pending_target(), Some(1));
        assert!(!exec.finish(1, Ok(Utc::now())));
    }

    #[test]
    fn test_new_value_queues_follow_up() {
        let mut exec = Executor::default();
        exec.begin(snap(1));
        assert_eq!(exec.begin(snap(2)), Begin::Queued(2));
        assert_eq!(exec.begin(snap(3)), Begin::Queued(2));
        assert_eq!(exec.pending_target(), Some(2));

        assert!(exec.finish(1, Ok(Utc::now())));
        assert_eq!(exec.begin(snap(3)), Begin::Started(2));
    }

    #[test]
    fn test_error_sticks_until_next_attempt() {
        let mut exec = Executor::default();
        exec.begin(snap(1));
        exec.finish(1, Err("server said no".into()));
        assert_eq!(exec.state().status, SaveStatus::Error);
        assert_eq!(exec.state().error.as_deref(), Some("server said no"));

        // Nothing but a new attempt clears it
        assert!(!exec.expire_saved(1));
        assert_eq!(exec.state().error.as_deref(), Some("server said no"));

        exec.begin(snap(2));
        assert_eq!(exec.state().status, SaveStatus::Saving);
        assert_eq!(exec.state().error, None);
    }

    #[test]
    fn test_blank_error_message_dropped() {
        let mut exec = Executor::default();
        exec.begin(snap(1));
        exec.finish(1, Err("   ".into()));
        assert_eq!(exec.state().status, SaveStatus::Error);
        assert_eq!(exec.state().error, None);
    }

    #[test]
    fn test_stale_display_window_ignored() {
        let mut exec = Executor::default();
        exec.begin(snap(1));
        exec.finish(1, Ok(Utc::now()));
        exec.begin(snap(2));
        exec.finish(2, Ok(Utc::now()));

        assert!(!exec.expire_saved(1));
        assert_eq!(exec.state().status, SaveStatus::Saved);
        assert!(exec.expire_saved(2));
    }

    #[test]
    fn test_last_saved_survives_failure() {
        let mut exec = Executor::default();
        let first = Utc::now();
        exec.begin(snap(1));
        exec.finish(1, Ok(first));
        exec.begin(snap(2));
        exec.finish(2, Err("offline".into()));

        assert_eq!(exec.state().last_saved, Some(first));
        assert_eq!(exec.pending_target(), None);
    }
}
