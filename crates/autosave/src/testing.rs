//! Test doubles for the coordinator

use crate::persist::Persister;
use anyhow::Result;
use async_trait::async_trait;
use draftsave_core::{FallbackRecord, FallbackStore};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Records every persist call and how many overlapped
pub(crate) struct SpyPersister {
    calls: Mutex<Vec<Value>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    failing: AtomicBool,
    latency: Duration,
}

impl SpyPersister {
    pub(crate) fn new(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            latency,
        })
    }

    pub(crate) fn calls(&self) -> Vec<Value> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub(crate) fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Persister<Value> for SpyPersister {
    async fn persist(&self, value: Value) -> Result<()> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().push(value);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("remote rejected draft");
        }
        Ok(())
    }
}

/// Fallback store whose writes always fail
pub(crate) struct FailingFallback;

impl FallbackStore for FailingFallback {
    fn write(&self, _key: &str, _record: &FallbackRecord) -> Result<()> {
        anyhow::bail!("storage quota exceeded")
    }

    fn read(&self, _key: &str) -> Result<Option<FallbackRecord>> {
        Ok(None)
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}
