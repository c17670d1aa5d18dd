//! Change detection and the debounce countdown
//!
//! Prevents a save on every keystroke: a change only (re)arms a countdown, and
//! the save runs once the countdown elapses without being superseded.

use draftsave_core::Snapshot;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Remembers the last observed snapshot
#[derive(Debug, Default)]
pub(crate) struct ChangeFilter {
    last: Option<Snapshot>,
}

impl ChangeFilter {
    /// Record `snapshot` if it differs from the last one
    ///
    /// Returns true when it was a change.
    pub(crate) fn admit(&mut self, snapshot: Snapshot) -> bool {
        if self.last == Some(snapshot) {
            return false;
        }
        self.last = Some(snapshot);
        true
    }

    pub(crate) fn last(&self) -> Option<Snapshot> {
        self.last
    }
}

/// A single cancellable timer
///
/// Each arm bumps the epoch; a firing timer must present the current epoch
/// through [`Countdown::claim`], so a timer cancelled too late to abort is
/// still ignored.
#[derive(Debug, Default)]
pub(crate) struct Countdown {
    epoch: u64,
    timer: Option<AbortHandle>,
}

impl Countdown {
    /// Cancel any live timer and start a new one
    ///
    /// `on_elapsed` receives the epoch it was armed with.
    pub(crate) fn arm<F>(&mut self, runtime: &Handle, delay: Duration, on_elapsed: F)
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.epoch += 1;
        let epoch = self.epoch;

        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            on_elapsed(epoch);
        });
        self.timer = Some(task.abort_handle());
    }

    /// Cancel the live timer, if any
    ///
    /// Returns true when a timer was pending.
    pub(crate) fn cancel(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                timer.abort();
                self.epoch += 1;
                true
            }
            None => false,
        }
    }

    /// Take ownership of an elapsed timer
    ///
    /// Only the timer armed with the current epoch succeeds, and only once.
    pub(crate) fn claim(&mut self, epoch: u64) -> bool {
        if self.timer.is_some() && self.epoch == epoch {
            self.timer = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.timer.is_some()
    }
}
