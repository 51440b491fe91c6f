//! In-memory usage counters with lazy monthly rollover.
//!
//! Each (user, feature) counter lives behind its own mutex. The outer map is
//! locked only long enough to find or insert a counter, so traffic for
//! different users and features never contends on the same lock.

use crate::{
    BillingMonth, Clock, CounterRecord, Feature, SystemClock, UsageCounter, UsageSnapshot, UserId,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

type SharedCounter = Arc<Mutex<UsageCounter>>;
type UserCounters = HashMap<Feature, SharedCounter>;

/// Owner of every usage counter.
///
/// Counters are created on first write and reset lazily: any read or write
/// that finds a counter from an earlier calendar month zeroes it and moves
/// its window to the current month before doing anything else.
///
/// # Example
///
/// ```
/// use fabula_quota::{Feature, QuotaStore, UserId};
///
/// let store = QuotaStore::with_system_clock();
/// let user = UserId::from("ana");
///
/// assert_eq!(store.current_count(&user, Feature::Chat), 0);
/// store.increment(&user, Feature::Chat);
/// assert_eq!(store.current_count(&user, Feature::Chat), 1);
/// ```
#[derive(Debug)]
pub struct QuotaStore {
    clock: Arc<dyn Clock>,
    counters: RwLock<HashMap<UserId, UserCounters>>,
}

impl QuotaStore {
    /// Create an empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty store on the system clock.
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Month the store currently considers active.
    pub fn current_month(&self) -> BillingMonth {
        BillingMonth::containing(self.clock.now())
    }

    fn existing(&self, user: &UserId, feature: Feature) -> Option<SharedCounter> {
        self.counters
            .read()
            .get(user)
            .and_then(|features| features.get(&feature))
            .cloned()
    }

    fn entry(&self, user: &UserId, feature: Feature) -> SharedCounter {
        if let Some(counter) = self.existing(user, feature) {
            return counter;
        }

        let window = self.current_month();
        let mut counters = self.counters.write();
        counters
            .entry(user.clone())
            .or_default()
            .entry(feature)
            .or_insert_with(|| {
                debug!(%user, %feature, %window, "Creating usage counter");
                Arc::new(Mutex::new(UsageCounter::new(window)))
            })
            .clone()
    }

    /// Uses recorded this month. Zero when the pair has never been used.
    ///
    /// Does not create a counter.
    #[instrument(skip_all, fields(%user, %feature))]
    pub fn current_count(&self, user: &UserId, feature: Feature) -> u64 {
        let Some(counter) = self.existing(user, feature) else {
            return 0;
        };
        let current = self.current_month();
        let mut counter = counter.lock();
        if counter.roll_over(current) {
            debug!(window = %current, "Usage window rolled over on read");
        }
        *counter.count()
    }

    /// Copy of the counter after rollover, if one exists.
    pub fn counter(&self, user: &UserId, feature: Feature) -> Option<UsageCounter> {
        let counter = self.existing(user, feature)?;
        let current = self.current_month();
        let mut counter = counter.lock();
        counter.roll_over(current);
        Some(counter.clone())
    }

    /// Record one use and return the new count. No upper bound is enforced.
    #[instrument(skip_all, fields(%user, %feature))]
    pub fn increment(&self, user: &UserId, feature: Feature) -> u64 {
        let counter = self.entry(user, feature);
        let current = self.current_month();
        let mut counter = counter.lock();
        counter.roll_over(current);
        let count = counter.increment();
        debug!(count, "Recorded usage");
        count
    }

    /// Record one use only if the count is below `limit`.
    ///
    /// The comparison and increment happen under the counter's lock.
    /// Returns the new count, or the unchanged count when the limit is reached.
    #[instrument(skip_all, fields(%user, %feature, limit))]
    pub fn increment_if_below(
        &self,
        user: &UserId,
        feature: Feature,
        limit: u64,
    ) -> Result<u64, u64> {
        let counter = self.entry(user, feature);
        let current = self.current_month();
        let mut counter = counter.lock();
        counter.roll_over(current);
        if *counter.count() < limit {
            let count = counter.increment();
            debug!(count, limit, "Recorded usage within limit");
            Ok(count)
        } else {
            Err(*counter.count())
        }
    }

    /// Remove one use, never going below zero. Returns the new count.
    #[instrument(skip_all, fields(%user, %feature))]
    pub fn decrement(&self, user: &UserId, feature: Feature) -> u64 {
        let Some(counter) = self.existing(user, feature) else {
            return 0;
        };
        let current = self.current_month();
        let mut counter = counter.lock();
        counter.roll_over(current);
        let count = counter.decrement();
        debug!(count, "Refunded usage");
        count
    }

    /// Zero one counter, or forget every counter of the user when `feature` is `None`.
    #[instrument(skip_all, fields(%user, ?feature))]
    pub fn reset(&self, user: &UserId, feature: Option<Feature>) {
        match feature {
            Some(feature) => {
                if let Some(counter) = self.existing(user, feature) {
                    let current = self.current_month();
                    counter.lock().clear(current);
                    info!(%feature, window = %current, "Reset usage counter");
                }
            }
            None => {
                if let Some(removed) = self.counters.write().remove(user) {
                    info!(counters = removed.len(), "Cleared all usage counters");
                }
            }
        }
    }

    /// Export every counter, rolled over to the current month.
    pub fn snapshot(&self) -> UsageSnapshot {
        let current = self.current_month();
        let counters = self.counters.read();

        let mut records: Vec<CounterRecord> = counters
            .iter()
            .flat_map(|(user, features)| {
                features.iter().map(move |(feature, counter)| {
                    let mut counter = counter.lock();
                    counter.roll_over(current);
                    CounterRecord {
                        user: user.clone(),
                        feature: *feature,
                        count: *counter.count(),
                        window: *counter.window(),
                    }
                })
            })
            .collect();
        records.sort_by(|a, b| (&a.user, a.feature).cmp(&(&b.user, b.feature)));

        UsageSnapshot::new(records)
    }

    /// Replace every counter with the contents of `snapshot`.
    ///
    /// Stale windows are kept as-is and roll over on next access. When a
    /// (user, feature) pair appears more than once, the later record wins.
    #[instrument(skip(self, snapshot), fields(counters = snapshot.counters.len()))]
    pub fn restore(&self, snapshot: UsageSnapshot) {
        let mut restored: HashMap<UserId, UserCounters> = HashMap::new();
        for record in snapshot.counters {
            let counter = Arc::new(Mutex::new(UsageCounter::with_count(
                record.count,
                record.window,
            )));
            let features = restored.entry(record.user.clone()).or_default();
            if features.insert(record.feature, counter).is_some() {
                warn!(
                    user = %record.user,
                    feature = %record.feature,
                    count = record.count,
                    "Duplicate counter in snapshot, keeping the later record"
                );
            }
        }

        *self.counters.write() = restored;
        info!("Restored usage counters");
    }
}
