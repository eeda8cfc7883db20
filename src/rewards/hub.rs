//! Serialized access to the process-wide ledger
//!
//! Sessions (frame ticks) and the accrual runner (its own thread) both
//! credit the ledger. Every operation here takes the lock once, applies the
//! whole read-modify-write and snapshots the record. The store write happens
//! after the ledger lock is released; a revision counter keeps a slower
//! writer from overwriting a newer record.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use super::ledger::{AccrualCredit, RewardLedger, RewardSource, StreakChange};
use crate::persistence::{KeyValueStore, USER_KEY, UserRecord, load_json, save_json};
use crate::platform::Clock;

struct HubInner {
    ledger: Mutex<RewardLedger>,
    clock: Arc<dyn Clock>,
    store: Option<Arc<dyn KeyValueStore>>,
    /// Bumped under the ledger lock on every mutation
    revision: AtomicU64,
    /// Revision of the record last written to the store
    saved_revision: Mutex<u64>,
}

impl HubInner {
    fn new(ledger: RewardLedger, clock: Arc<dyn Clock>, store: Option<Arc<dyn KeyValueStore>>) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            clock,
            store,
            revision: AtomicU64::new(0),
            saved_revision: Mutex::new(0),
        }
    }
}

/// Cloneable handle to the single reward ledger
#[derive(Clone)]
pub struct RewardHub {
    inner: Arc<HubInner>,
}

impl std::fmt::Debug for RewardHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardHub")
            .field("ledger", &*self.lock())
            .field("persistent", &self.inner.store.is_some())
            .finish()
    }
}

impl RewardHub {
    /// In-memory hub (no write-through)
    pub fn new(ledger: RewardLedger, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(HubInner::new(ledger, clock, None)),
        }
    }

    /// Restore the ledger from `store` (or start fresh) and persist every
    /// later mutation back to it.
    pub fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let ledger = match load_json::<UserRecord>(store.as_ref(), USER_KEY) {
            Ok(Some(record)) => {
                let ledger = RewardLedger::from_record(record);
                log::info!(
                    "Loaded ledger: balance {:.4}, streak {}, {} referrals",
                    ledger.balance(),
                    ledger.streak_days(),
                    ledger.referrals().len()
                );
                ledger
            }
            Ok(None) => {
                log::info!("No ledger found, starting fresh");
                RewardLedger::new(clock.now())
            }
            Err(e) => {
                log::warn!("Ledger record unreadable ({}), starting fresh", e);
                RewardLedger::new(clock.now())
            }
        };

        Self {
            inner: Arc::new(HubInner::new(ledger, clock, Some(store))),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    fn lock(&self) -> MutexGuard<'_, RewardLedger> {
        self.inner.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply one mutation under the lock, then write through
    fn mutate<R>(&self, f: impl FnOnce(&mut RewardLedger, DateTime<Utc>) -> R) -> R {
        let now = self.now();
        let (result, pending) = {
            let mut ledger = self.lock();
            let result = f(&mut ledger, now);
            let pending = self.inner.store.as_ref().map(|_| {
                let revision = self.inner.revision.fetch_add(1, Ordering::Relaxed) + 1;
                (revision, ledger.to_record())
            });
            (result, pending)
        };

        if let Some((revision, record)) = pending {
            self.persist(revision, &record);
        }
        result
    }

    fn persist(&self, revision: u64, record: &UserRecord) {
        let Some(store) = &self.inner.store else {
            return;
        };
        let mut saved = self
            .inner
            .saved_revision
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if revision <= *saved {
            return;
        }
        match save_json(store.as_ref(), USER_KEY, record) {
            Ok(()) => *saved = revision,
            Err(e) => log::warn!("Failed to save ledger: {}", e),
        }
    }

    /// Read-only view of the ledger at this instant
    pub fn snapshot(&self) -> RewardLedger {
        self.lock().clone()
    }

    pub fn credit(&self, amount: f64, source: RewardSource) -> bool {
        self.mutate(|ledger, now| ledger.credit(amount, source, now))
    }

    pub fn touch_reward_time(&self) {
        self.mutate(|ledger, now| ledger.touch_reward_time(now))
    }

    pub fn refresh_streak(&self) -> StreakChange {
        let change = self.mutate(|ledger, now| ledger.refresh_streak(now));
        match change {
            StreakChange::Extended(days) => log::info!("Login streak extended to {} days", days),
            StreakChange::Reset => log::info!("Login streak reset"),
            StreakChange::Unchanged => {}
        }
        change
    }

    pub fn add_referral(&self, id: &str) -> bool {
        let added = self.mutate(|ledger, _| ledger.add_referral(id));
        if added {
            log::info!("Referral {} registered", id);
        }
        added
    }

    pub fn add_play_time(&self, minutes: u64) {
        if minutes > 0 {
            self.mutate(|ledger, _| ledger.add_play_time(minutes))
        }
    }

    pub fn record_game_played(&self) {
        self.mutate(|ledger, _| ledger.record_game_played())
    }

    /// Credit every whole `interval` since the last time credit
    pub fn accrue_time(&self, interval: Duration) -> Option<AccrualCredit> {
        self.mutate(|ledger, now| ledger.accrue_time(now, interval))
    }
}
