//! Wall-clock sources for window rollover.

use chrono::{DateTime, Months, TimeDelta, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Source of the current time.
///
/// The quota store reads the clock on every access to decide whether a
/// counter's window is stale, so tests inject a [`ManualClock`] instead of
/// waiting for real month boundaries.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock. Clones share the same instant.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use fabula_quota::{Clock, ManualClock};
///
/// let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap());
/// clock.advance_months(1);
/// assert_eq!(clock.now(), Utc.with_ymd_and_hms(2026, 2, 28, 0, 0, 0).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Jump to an arbitrary instant, forwards or backwards.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }

    /// Move forward by a duration.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock();
        if let Some(next) = now.checked_add_signed(delta) {
            *now = next;
        }
    }

    /// Move forward by whole calendar months, clamping the day of month.
    pub fn advance_months(&self, months: u32) {
        let mut now = self.now.lock();
        if let Some(next) = now.checked_add_months(Months::new(months)) {
            *now = next;
        }
    }

    /// Move backward by whole calendar months.
    pub fn rewind_months(&self, months: u32) {
        let mut now = self.now.lock();
        if let Some(prev) = now.checked_sub_months(Months::new(months)) {
            *now = prev;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
