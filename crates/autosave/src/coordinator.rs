//! The auto-save coordinator
//!
//! All mutable state sits behind one mutex that is never held across an
//! `.await`. Timers and save cycles run as tasks on the runtime captured at
//! construction, so `observe` may be called from any thread.

use crate::config::AutoSaveConfig;
use crate::debounce::{ChangeFilter, Countdown};
use crate::executor::{Begin, Executor};
use crate::persist::Persister;
use crate::status::{SaveState, SaveStatus};
use chrono::{DateTime, Utc};
use draftsave_core::{FallbackRecord, FallbackStore, NoFallback, Snapshot};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Debounced, single-flight auto-save for one subject value
///
/// Dropping the coordinator disposes it.
pub struct AutoSave<T> {
    shared: Arc<Shared<T>>,
}

/// Builder for [`AutoSave`]
pub struct AutoSaveBuilder<T> {
    persister: Arc<dyn Persister<T>>,
    fallback: Arc<dyn FallbackStore>,
    config: AutoSaveConfig,
}

impl<T> AutoSaveBuilder<T>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    pub fn config(mut self, config: AutoSaveConfig) -> Self {
        self.config = config;
        self
    }

    /// Where successful saves leave their local copy (default: nowhere)
    pub fn fallback(mut self, store: impl FallbackStore + 'static) -> Self {
        self.fallback = Arc::new(store);
        self
    }

    /// Build on the current Tokio runtime
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn build(self) -> AutoSave<T> {
        self.build_on(Handle::current())
    }

    /// Build on an explicit runtime
    pub fn build_on(self, runtime: Handle) -> AutoSave<T> {
        let (state_tx, _) = watch::channel(SaveState::default());
        let (progress_tx, _) = watch::channel(Progress::default());

        AutoSave {
            shared: Arc::new(Shared {
                runtime,
                persister: self.persister,
                fallback: self.fallback,
                inner: Mutex::new(Inner {
                    enabled: self.config.enabled,
                    disposed: false,
                    latest: None,
                    changes: ChangeFilter::default(),
                    countdown: Countdown::default(),
                    executor: Executor::default(),
                    display_timer: None,
                }),
                config: self.config,
                state_tx,
                progress_tx,
            }),
        }
    }
}

impl<T> AutoSave<T>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    /// Start building a coordinator around a persistence capability
    pub fn builder(persister: impl Persister<T> + 'static) -> AutoSaveBuilder<T> {
        AutoSaveBuilder {
            persister: Arc::new(persister),
            fallback: Arc::new(NoFallback),
            config: AutoSaveConfig::default(),
        }
    }

    /// Coordinator with the given config and no fallback store
    pub fn new(persister: impl Persister<T> + 'static, config: AutoSaveConfig) -> Self {
        Self::builder(persister).config(config).build()
    }

    /// Report the current value of the subject
    ///
    /// A value whose content differs from the last observed one restarts the
    /// debounce countdown. Returns true when a countdown was armed.
    pub fn observe(&self, value: &T) -> bool {
        {
            let inner = self.shared.inner.lock();
            if !inner.enabled || inner.disposed {
                return false;
            }
        }

        let snapshot = match Snapshot::of(value) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Ignoring change that cannot be snapshotted: {}", e);
                return false;
            }
        };

        let mut inner = self.shared.inner.lock();
        if !inner.enabled || inner.disposed || !inner.changes.admit(snapshot) {
            return false;
        }
        inner.latest = Some(value.clone());

        let delay = self.shared.config.debounce();
        let shared = Arc::clone(&self.shared);
        let runtime = self.shared.runtime.clone();
        inner
            .countdown
            .arm(&runtime, delay, move |epoch| shared.countdown_elapsed(epoch));

        debug!(snapshot = ?snapshot, delay_ms = delay.as_millis() as u64, "Change observed, countdown armed");
        true
    }

    /// Record a value that is already persisted as the comparison baseline
    ///
    /// Nothing is scheduled; only later, different values trigger saves.
    pub fn seed(&self, value: &T) {
        let snapshot = match Snapshot::of(value) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Ignoring baseline that cannot be snapshotted: {}", e);
                return;
            }
        };

        let mut inner = self.shared.inner.lock();
        if inner.disposed {
            return;
        }
        inner.changes.admit(snapshot);
        inner.latest = Some(value.clone());
    }

    /// Save the latest value now and wait for the outcome
    ///
    /// Cancels any pending countdown. If a save is already running for the
    /// same value this waits for it; if it is running for an older value a
    /// single follow-up save is queued behind it.
    pub async fn trigger_save(&self) -> SaveState {
        let target = {
            let mut inner = self.shared.inner.lock();
            if inner.disposed {
                return inner.executor.state().clone();
            }
            if inner.countdown.cancel() {
                debug!("Manual save supersedes pending countdown");
            }
            self.shared.start_or_queue(&mut inner)
        };

        match target {
            Some(cycle) => self.shared.wait_for(cycle).await,
            None => self.state(),
        }
    }

    /// Fire-and-forget form of [`AutoSave::trigger_save`]
    pub fn request_save(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.disposed {
            return;
        }
        inner.countdown.cancel();
        self.shared.start_or_queue(&mut inner);
    }

    /// Run a pending countdown's save now and wait for all outstanding work
    ///
    /// Returns immediately when nothing is pending or running.
    pub async fn flush(&self) -> SaveState {
        let target = {
            let mut inner = self.shared.inner.lock();
            if inner.disposed {
                return inner.executor.state().clone();
            }
            if inner.countdown.cancel() {
                debug!("Flushing pending countdown");
                self.shared.start_or_queue(&mut inner)
            } else {
                inner.executor.pending_target()
            }
        };

        match target {
            Some(cycle) => self.shared.wait_for(cycle).await,
            None => self.state(),
        }
    }

    /// Turn automatic saving on or off
    ///
    /// Turning it off cancels a pending countdown. Manual saves still work.
    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.shared.inner.lock();
        inner.enabled = enabled;
        if !enabled && inner.countdown.cancel() {
            debug!("Auto-save disabled, pending countdown cancelled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.inner.lock().enabled
    }

    /// Tear the coordinator down
    ///
    /// The pending countdown is cancelled and results of saves still in
    /// flight are discarded. The persistence calls themselves run to
    /// completion.
    pub fn dispose(&self) {
        self.shared.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.inner.lock().disposed
    }

    /// Current status, last save time and last error
    pub fn state(&self) -> SaveState {
        self.shared.state_tx.borrow().clone()
    }

    pub fn status(&self) -> SaveStatus {
        self.shared.state_tx.borrow().status
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.shared.state_tx.borrow().last_saved
    }

    pub fn error(&self) -> Option<String> {
        self.shared.state_tx.borrow().error.clone()
    }

    /// True while a persistence call is in flight
    pub fn is_saving(&self) -> bool {
        self.shared.inner.lock().executor.is_saving()
    }

    /// True while a debounce countdown is pending
    pub fn has_pending_change(&self) -> bool {
        self.shared.inner.lock().countdown.is_armed()
    }

    /// Receive every state transition
    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.shared.state_tx.subscribe()
    }

    pub fn config(&self) -> &AutoSaveConfig {
        &self.shared.config
    }
}

impl<T> Drop for AutoSave<T> {
    fn drop(&mut self) {
        self.shared.dispose();
    }
}

struct Shared<T> {
    runtime: Handle,
    persister: Arc<dyn Persister<T>>,
    fallback: Arc<dyn FallbackStore>,
    config: AutoSaveConfig,
    inner: Mutex<Inner<T>>,
    state_tx: watch::Sender<SaveState>,
    progress_tx: watch::Sender<Progress>,
}

struct Inner<T> {
    enabled: bool,
    disposed: bool,
    /// Most recently observed value; its snapshot is `changes.last()`
    latest: Option<T>,
    changes: ChangeFilter,
    countdown: Countdown,
    executor: Executor,
    display_timer: Option<AbortHandle>,
}

/// Completion progress, for callers waiting on a cycle
#[derive(Debug, Default, Clone, Copy)]
struct Progress {
    completed: u64,
    disposed: bool,
}

impl<T> Shared<T> {
    fn dispose(&self) {
        let mut inner = self.inner.lock();
        if inner.disposed {
            return;
        }
        inner.disposed = true;
        inner.countdown.cancel();
        if let Some(timer) = inner.display_timer.take() {
            timer.abort();
        }
        self.progress_tx.send_modify(|p| p.disposed = true);
        debug!("Auto-save disposed");
    }

    fn publish(&self, inner: &Inner<T>) {
        self.state_tx.send_replace(inner.executor.state().clone());
    }

    async fn wait_for(&self, cycle: u64) -> SaveState {
        let mut progress = self.progress_tx.subscribe();
        let _ = progress
            .wait_for(|p| p.disposed || p.completed >= cycle)
            .await;
        self.state_tx.borrow().clone()
    }
}

impl<T> Shared<T>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    fn countdown_elapsed(self: &Arc<Self>, epoch: u64) {
        let mut inner = self.inner.lock();
        if inner.disposed || !inner.countdown.claim(epoch) {
            return;
        }
        debug!("Countdown elapsed");
        self.start_or_queue(&mut inner);
    }

    /// Start a cycle for the latest value, or attach to the running one
    ///
    /// Returns the cycle whose completion covers the latest value, or `None`
    /// when nothing has been observed yet.
    fn start_or_queue(self: &Arc<Self>, inner: &mut Inner<T>) -> Option<u64> {
        let snapshot = inner.changes.last()?;
        let begin = inner.executor.begin(snapshot);

        match begin {
            Begin::Started(cycle) => {
                let value = inner.latest.clone()?;
                self.publish(inner);
                self.runtime.spawn(Arc::clone(self).run_cycles(cycle, value));
            }
            Begin::Joined(cycle) => debug!(cycle, "Save already in flight for this value"),
            Begin::Queued(cycle) => debug!(cycle, "Save in flight, follow-up queued"),
        }
        Some(begin.cycle())
    }

    /// Drive a cycle and any follow-ups queued while it ran
    async fn run_cycles(self: Arc<Self>, mut cycle: u64, mut value: T) {
        loop {
            debug!(cycle, "Persisting");
            let result = AssertUnwindSafe(self.persister.persist(value.clone()))
                .catch_unwind()
                .await;

            let outcome = match result {
                Ok(Ok(())) => Ok(Utc::now()),
                Ok(Err(e)) => Err(format!("{:#}", e)),
                Err(_) => Err("save task panicked".to_string()),
            };

            let next = {
                let mut inner = self.inner.lock();
                if inner.disposed {
                    debug!(cycle, "Discarding save result after dispose");
                    return;
                }
                // Under the lock so dispose cannot slip in before the write
                if let Ok(saved_at) = &outcome {
                    self.write_fallback(&value, *saved_at);
                }

                let follow_up = inner.executor.finish(cycle, outcome.clone());
                if outcome.is_ok() {
                    self.arm_display_timer(&mut inner, cycle);
                }
                self.publish(&inner);
                self.progress_tx.send_modify(|p| p.completed = cycle);

                if follow_up {
                    self.begin_follow_up(&mut inner)
                } else {
                    None
                }
            };

            match &outcome {
                Ok(_) => info!(cycle, "Saved"),
                Err(message) => warn!(cycle, "Save failed: {}", message),
            }

            match next {
                Some((next_cycle, next_value)) => {
                    cycle = next_cycle;
                    value = next_value;
                }
                None => return,
            }
        }
    }

    fn begin_follow_up(&self, inner: &mut Inner<T>) -> Option<(u64, T)> {
        let snapshot = inner.changes.last()?;
        match inner.executor.begin(snapshot) {
            Begin::Started(cycle) => {
                let value = inner.latest.clone()?;
                // The follow-up carries the latest value; its countdown is spent
                if inner.countdown.cancel() {
                    debug!(cycle, "Follow-up save supersedes pending countdown");
                }
                self.publish(inner);
                debug!(cycle, "Starting queued follow-up save");
                Some((cycle, value))
            }
            Begin::Joined(_) | Begin::Queued(_) => None,
        }
    }

    fn arm_display_timer(self: &Arc<Self>, inner: &mut Inner<T>, cycle: u64) {
        if let Some(timer) = inner.display_timer.take() {
            timer.abort();
        }

        let shared = Arc::clone(self);
        let window = self.config.saved_display();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(window).await;
            let mut inner = shared.inner.lock();
            if !inner.disposed && inner.executor.expire_saved(cycle) {
                shared.publish(&inner);
            }
        });
        inner.display_timer = Some(task.abort_handle());
    }

    /// Best-effort local copy; failures are logged and dropped
    fn write_fallback(&self, value: &T, saved_at: DateTime<Utc>) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                debug!("Skipping fallback snapshot: {}", e);
                return;
            }
        };

        let record = FallbackRecord::new(value, saved_at);
        if let Err(e) = self.fallback.write(&self.config.fallback_key, &record) {
            debug!("Fallback snapshot write failed: {:#}", e);
        }
    }
}
