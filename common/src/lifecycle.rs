//! Cluster-node-local lifecycle coordination.
//!
//! A single read-cheap lock gates whether new commands may begin, and a job
//! counter tracks commands currently past the lock check. Reload and
//! migration take the lock, then wait for the counter to drain before
//! touching shared state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep};

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared lock/counter pair coordinating startup, reload and migration
/// against in-flight commands.
#[derive(Debug, Default)]
pub struct LifecycleState {
    locked: AtomicBool,
    jobs: AtomicU64,
}

impl LifecycleState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// True while a reload or migration holds the lock.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Takes the lock. Returns false if it was already held.
    pub fn lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    /// Registers an in-flight command. Returns `None` while locked; the
    /// guard decrements the counter on drop, panics included.
    pub fn try_enter(self: &Arc<Self>) -> Option<JobGuard> {
        if self.is_locked() {
            return None;
        }
        self.jobs.fetch_add(1, Ordering::AcqRel);
        Some(JobGuard {
            state: Arc::clone(self),
        })
    }

    pub fn in_flight(&self) -> u64 {
        self.jobs.load(Ordering::Acquire)
    }

    /// Waits until no jobs remain in flight, polling at a fixed interval.
    /// Returns false if the timeout elapses first.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.drain_to(0, timeout).await
    }

    /// Waits for the in-flight count to fall to `baseline`. An operation
    /// that is itself counted drains to baseline 1, not 0.
    pub async fn drain_to(&self, baseline: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight() > baseline {
            if Instant::now() >= deadline {
                return false;
            }
            sleep(DRAIN_POLL_INTERVAL).await;
        }
        true
    }
}

/// RAII handle for one in-flight command.
pub struct JobGuard {
    state: Arc<LifecycleState>,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.state.jobs.fetch_sub(1, Ordering::AcqRel);
    }
}
