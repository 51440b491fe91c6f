//! Permission decisions and usage recording.
//!
//! Two ways to gate a feature:
//!
//! - [`UsageGate::check_limit`] then [`UsageGate::track_usage`]. The two calls
//!   are not atomic: concurrent requests for the same user and feature may
//!   all pass the check before any of them is tracked, overshooting the
//!   allowance by the number of racers.
//! - [`UsageGate::try_acquire`], which compares and increments under the
//!   counter's lock and cannot overshoot. Pair it with
//!   [`UsageGate::refund`] when the delegated call fails.

use crate::{
    Allowance, BillingMonth, Feature, QuotaStore, Tier, TierPolicy, UsageRepository,
    UsageSnapshot, UserId,
};
use fabula_error::{FabulaResult, QuotaError, QuotaErrorKind, QuotaResult};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument, warn};

/// Usage of one feature in the current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureUsage {
    /// Feature key
    pub feature: Feature,
    /// Uses recorded this month
    pub used: u64,
    /// Monthly allowance for the tier
    pub allowance: Allowance,
    /// Uses left, `None` when unlimited
    pub remaining: Option<u64>,
}

/// Per-feature usage of one user under one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    /// User the report describes
    pub user: UserId,
    /// Tier the allowances come from
    pub tier: Tier,
    /// Month being reported
    pub window: BillingMonth,
    /// One entry per feature
    pub features: Vec<FeatureUsage>,
}

impl UsageReport {
    /// Entry for one feature.
    pub fn feature(&self, feature: Feature) -> Option<&FeatureUsage> {
        self.features.iter().find(|usage| usage.feature == feature)
    }
}

/// Answers "may this user invoke this feature now?" and records invocations.
///
/// # Example
///
/// ```
/// use fabula_quota::{Feature, QuotaStore, Tier, TierPolicy, UsageGate, UserId};
///
/// let gate = UsageGate::new(TierPolicy::default(), QuotaStore::with_system_clock());
/// let user = UserId::from("ana");
///
/// if gate.check_limit(&user, Feature::StoryGeneration, Tier::Free) {
///     // ... call the generation model ...
///     gate.track_usage(&user, Feature::StoryGeneration);
/// }
/// assert_eq!(gate.store().current_count(&user, Feature::StoryGeneration), 1);
/// ```
#[derive(Debug)]
pub struct UsageGate {
    policy: TierPolicy,
    store: QuotaStore,
}

impl UsageGate {
    /// Compose a policy and a store.
    pub fn new(policy: TierPolicy, store: QuotaStore) -> Self {
        Self { policy, store }
    }

    /// The allowance table.
    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    /// The counter store.
    pub fn store(&self) -> &QuotaStore {
        &self.store
    }

    /// Whether the user may invoke the feature now. Never changes any count.
    #[instrument(skip_all, fields(%user, %feature, %tier))]
    pub fn check_limit(&self, user: &UserId, feature: Feature, tier: Tier) -> bool {
        let allowance = self.policy.allowance_for(tier, feature);
        let allowed = match allowance {
            Allowance::Unlimited => true,
            Allowance::NoAccess => false,
            Allowance::Limited(_) => allowance.permits(self.store.current_count(user, feature)),
        };
        debug!(%allowance, allowed, "Checked usage limit");
        allowed
    }

    /// Record one invocation. Does not re-check the limit.
    #[instrument(skip_all, fields(%user, %feature))]
    pub fn track_usage(&self, user: &UserId, feature: Feature) {
        self.store.increment(user, feature);
    }

    /// Check and record in one step. Returns the new count.
    ///
    /// # Errors
    ///
    /// [`QuotaErrorKind::NoAccess`] when the tier lacks the feature and
    /// [`QuotaErrorKind::LimitReached`] when the monthly allowance is used up.
    /// Nothing is recorded on error.
    #[instrument(skip_all, fields(%user, %feature, %tier))]
    pub fn try_acquire(&self, user: &UserId, feature: Feature, tier: Tier) -> QuotaResult<u64> {
        match self.policy.allowance_for(tier, feature) {
            Allowance::Unlimited => Ok(self.store.increment(user, feature)),
            Allowance::NoAccess => {
                warn!("Feature not available on tier");
                Err(QuotaError::new(QuotaErrorKind::NoAccess {
                    tier: tier.to_string(),
                    feature: feature.to_string(),
                }))
            }
            Allowance::Limited(cap) => self
                .store
                .increment_if_below(user, feature, u64::from(cap))
                .map_err(|used| {
                    warn!(used, allowance = cap, "Monthly limit reached");
                    QuotaError::new(QuotaErrorKind::LimitReached {
                        feature: feature.to_string(),
                        used,
                        allowance: cap,
                    })
                }),
        }
    }

    /// Give back one acquired use after the delegated call failed.
    #[instrument(skip_all, fields(%user, %feature))]
    pub fn refund(&self, user: &UserId, feature: Feature) -> u64 {
        self.store.decrement(user, feature)
    }

    /// Zero one counter, or every counter of the user.
    pub fn reset(&self, user: &UserId, feature: Option<Feature>) {
        self.store.reset(user, feature);
    }

    /// Current usage of every feature for the user under `tier`.
    #[instrument(skip_all, fields(%user, %tier))]
    pub fn usage_report(&self, user: &UserId, tier: Tier) -> UsageReport {
        let features = Feature::iter()
            .map(|feature| {
                let allowance = self.policy.allowance_for(tier, feature);
                let used = self.store.current_count(user, feature);
                FeatureUsage {
                    feature,
                    used,
                    allowance,
                    remaining: allowance.remaining(used),
                }
            })
            .collect();

        UsageReport {
            user: user.clone(),
            tier,
            window: self.store.current_month(),
            features,
        }
    }

    /// Replace the store's counters with the repository's snapshot, if any.
    ///
    /// Returns the number of counters restored.
    ///
    /// # Errors
    ///
    /// Propagates repository read and decode errors.
    pub async fn restore_from(&self, repository: &dyn UsageRepository) -> FabulaResult<usize> {
        let Some(snapshot) = repository.load().await? else {
            debug!("No persisted usage counters");
            return Ok(0);
        };
        let restored = snapshot.counters.len();
        self.store.restore(snapshot);
        Ok(restored)
    }

    /// Write every counter to the repository.
    ///
    /// Returns the number of counters written.
    ///
    /// # Errors
    ///
    /// Propagates repository write and encode errors.
    pub async fn persist_to(&self, repository: &dyn UsageRepository) -> FabulaResult<usize> {
        let snapshot: UsageSnapshot = self.store.snapshot();
        let written = snapshot.counters.len();
        repository.save(&snapshot).await?;
        info!(counters = written, "Persisted usage counters");
        Ok(written)
    }
}
