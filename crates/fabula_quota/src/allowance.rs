//! Monthly allowance values.

use fabula_error::{QuotaError, QuotaErrorKind};
use serde::{Deserialize, Serialize};

/// Monthly cap for one tier and feature.
///
/// Serialized as a raw integer: `-1` is unlimited, `0` is no access and any
/// positive value is a finite cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Allowance {
    /// Feature is not available on the tier
    NoAccess,
    /// At most this many uses per calendar month
    Limited(u32),
    /// No monthly cap
    Unlimited,
}

impl Allowance {
    /// Raw value of the unlimited sentinel.
    pub const UNLIMITED_RAW: i64 = -1;

    /// Finite allowance; a cap of zero is treated as no access.
    pub fn limited(cap: u32) -> Self {
        if cap == 0 {
            Allowance::NoAccess
        } else {
            Allowance::Limited(cap)
        }
    }

    /// Whether another use is allowed after `used` uses this window.
    ///
    /// ```
    /// use fabula_quota::Allowance;
    ///
    /// assert!(Allowance::Limited(10).permits(9));
    /// assert!(!Allowance::Limited(10).permits(10));
    /// assert!(Allowance::Unlimited.permits(u64::MAX));
    /// assert!(!Allowance::NoAccess.permits(0));
    /// ```
    pub fn permits(&self, used: u64) -> bool {
        match self {
            Allowance::NoAccess => false,
            Allowance::Limited(cap) => used < u64::from(*cap),
            Allowance::Unlimited => true,
        }
    }

    /// Uses left after `used` uses, `None` when unlimited.
    pub fn remaining(&self, used: u64) -> Option<u64> {
        match self {
            Allowance::NoAccess => Some(0),
            Allowance::Limited(cap) => Some(u64::from(*cap).saturating_sub(used)),
            Allowance::Unlimited => None,
        }
    }
}

impl TryFrom<i64> for Allowance {
    type Error = QuotaError;

    #[track_caller]
    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            Self::UNLIMITED_RAW => Ok(Allowance::Unlimited),
            0 => Ok(Allowance::NoAccess),
            n => u32::try_from(n)
                .map(Allowance::Limited)
                .map_err(|_| QuotaError::new(QuotaErrorKind::InvalidAllowance(n))),
        }
    }
}

impl From<Allowance> for i64 {
    fn from(allowance: Allowance) -> Self {
        match allowance {
            Allowance::NoAccess => 0,
            Allowance::Limited(cap) => i64::from(cap),
            Allowance::Unlimited => Allowance::UNLIMITED_RAW,
        }
    }
}

impl std::fmt::Display for Allowance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Allowance::NoAccess => write!(f, "no access"),
            Allowance::Limited(cap) => write!(f, "{}", cap),
            Allowance::Unlimited => write!(f, "unlimited"),
        }
    }
}
