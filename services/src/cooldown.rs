//! Per-creator creation cooldown.
//!
//! Entries are written when a ticket is created and consulted before the
//! next creation is allowed. Expired entries are removed both lazily on
//! lookup and by a periodic sweep so the map does not grow with every
//! player who ever filed a ticket.

use dashmap::DashMap;
use db::domain::Creator;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct CooldownTracker {
    /// Creator to epoch-second expiry.
    expiries: DashMap<Creator, i64>,
}

impl CooldownTracker {
    pub fn new() -> CooldownTracker {
        CooldownTracker::default()
    }

    /// True if the creator filed a ticket less than the cooldown window ago.
    /// The console is never cooled down.
    pub fn under_cooldown(&self, creator: &Creator, now: i64) -> bool {
        if !creator.is_user() {
            return false;
        }
        // Copy the expiry out so the shard read guard is released before
        // `remove` takes a write lock on the same shard.
        match self.expiries.get(creator).map(|expiry| *expiry) {
            Some(expiry) if expiry > now => true,
            Some(_) => {
                drop(self.expiries.remove(creator));
                false
            }
            None => false,
        }
    }

    pub fn apply(&self, creator: &Creator, now: i64, window: Duration) {
        if !creator.is_user() {
            return;
        }
        self.expiries
            .insert(creator.clone(), now + window.as_secs() as i64);
    }

    pub fn clear(&self) {
        self.expiries.clear();
    }

    fn sweep(&self, now: i64) {
        self.expiries.retain(|_, expiry| *expiry > now);
    }

    /// Background task that drops expired entries once per window.
    pub fn spawn_sweeper(self: &Arc<Self>, window: Duration) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(window.max(Duration::from_secs(1)));
            interval.tick().await;
            loop {
                interval.tick().await;
                tracker.sweep(chrono::Utc::now().timestamp());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> Creator {
        Creator::User(Uuid::new_v4())
    }

    #[test]
    fn blocks_until_expiry() {
        let tracker = CooldownTracker::new();
        let creator = user();
        tracker.apply(&creator, 1_000, Duration::from_secs(60));
        assert!(tracker.under_cooldown(&creator, 1_059));
        assert!(!tracker.under_cooldown(&creator, 1_060));
    }

    #[test]
    fn expired_lookup_removes_entry() {
        let tracker = CooldownTracker::new();
        let creator = user();
        tracker.apply(&creator, 1_000, Duration::from_secs(10));
        assert!(!tracker.under_cooldown(&creator, 2_000));
        assert!(tracker.expiries.is_empty());
    }

    #[test]
    fn console_is_exempt() {
        let tracker = CooldownTracker::new();
        tracker.apply(&Creator::Console, 1_000, Duration::from_secs(60));
        assert!(!tracker.under_cooldown(&Creator::Console, 1_001));
    }

    #[test]
    fn sweep_only_drops_expired() {
        let tracker = CooldownTracker::new();
        let (a, b) = (user(), user());
        tracker.apply(&a, 1_000, Duration::from_secs(10));
        tracker.apply(&b, 1_000, Duration::from_secs(100));
        tracker.sweep(1_050);
        assert!(!tracker.expiries.contains_key(&a));
        assert!(tracker.expiries.contains_key(&b));
    }
}
