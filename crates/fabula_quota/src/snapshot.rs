//! Serializable export of every usage counter.

use crate::{BillingMonth, Feature, UserId};
use serde::{Deserialize, Serialize};

/// Format version written by this crate.
pub const SNAPSHOT_VERSION: u32 = 1;

/// One persisted counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// Owner of the counter
    pub user: UserId,
    /// Feature being counted
    pub feature: Feature,
    /// Uses recorded in `window`
    pub count: u64,
    /// Month the count belongs to
    pub window: BillingMonth,
}

/// Point-in-time copy of a quota store.
///
/// ```json
/// {
///   "version": 1,
///   "counters": [
///     { "user": "ana", "feature": "story_generation", "count": 3,
///       "window": { "year": 2026, "month": 10 } }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Format version
    pub version: u32,
    /// Counters ordered by user, then feature
    pub counters: Vec<CounterRecord>,
}

impl UsageSnapshot {
    /// Snapshot in the current format.
    pub fn new(counters: Vec<CounterRecord>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            counters,
        }
    }

    /// Whether the snapshot holds no counters.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

impl Default for UsageSnapshot {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
