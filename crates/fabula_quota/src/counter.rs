//! Billing windows and per-feature usage counters.

use chrono::{DateTime, Datelike, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Calendar month a counter accumulates against.
///
/// Deserialization rejects months outside `1..=12`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Getters,
)]
#[serde(try_from = "RawBillingMonth")]
pub struct BillingMonth {
    /// Calendar year
    year: i32,
    /// Month of year, 1 through 12
    month: u32,
}

impl BillingMonth {
    /// Month containing the given instant.
    pub fn containing(instant: DateTime<Utc>) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
        }
    }

    /// Whole calendar months from `self` to `later`.
    ///
    /// Negative when `later` precedes `self`.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use fabula_quota::BillingMonth;
    ///
    /// let nov = BillingMonth::containing(Utc.with_ymd_and_hms(2025, 11, 30, 23, 0, 0).unwrap());
    /// let feb = BillingMonth::containing(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
    /// assert_eq!(nov.months_until(feb), 3);
    /// assert_eq!(feb.months_until(nov), -3);
    /// ```
    pub fn months_until(&self, later: BillingMonth) -> i64 {
        later.ordinal() - self.ordinal()
    }

    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month)
    }
}

#[derive(Deserialize)]
struct RawBillingMonth {
    year: i32,
    month: u32,
}

impl TryFrom<RawBillingMonth> for BillingMonth {
    type Error = String;

    fn try_from(raw: RawBillingMonth) -> Result<Self, Self::Error> {
        if !(1..=12).contains(&raw.month) {
            return Err(format!("month {} of {} is not in 1..=12", raw.month, raw.year));
        }
        Ok(Self {
            year: raw.year,
            month: raw.month,
        })
    }
}

impl std::fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Usage count for one (user, feature) pair within its window.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct UsageCounter {
    /// Uses recorded in the window
    count: u64,
    /// Month the count belongs to
    window: BillingMonth,
}

impl UsageCounter {
    pub(crate) fn new(window: BillingMonth) -> Self {
        Self { count: 0, window }
    }

    pub(crate) fn with_count(count: u64, window: BillingMonth) -> Self {
        Self { count, window }
    }

    /// Reset the counter if `current` is at least one month past its window.
    ///
    /// Returns `true` when a reset happened. A window in the future (clock
    /// moved backwards) is left alone.
    pub(crate) fn roll_over(&mut self, current: BillingMonth) -> bool {
        if self.window.months_until(current) >= 1 {
            self.count = 0;
            self.window = current;
            true
        } else {
            false
        }
    }

    pub(crate) fn increment(&mut self) -> u64 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    pub(crate) fn decrement(&mut self) -> u64 {
        self.count = self.count.saturating_sub(1);
        self.count
    }

    pub(crate) fn clear(&mut self, current: BillingMonth) {
        self.count = 0;
        self.window = current;
    }
}
