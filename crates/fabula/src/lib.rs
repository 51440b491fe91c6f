//! Fabula - usage quotas for a creative-writing assistant
//!
//! Story, chapter, character, cover, chat, export, screenplay and narration
//! requests are metered per user and calendar month. Each subscription tier
//! grants a monthly allowance per feature, which may be a finite cap,
//! unlimited, or no access at all.
//!
//! # Quick Start
//!
//! ```
//! use fabula::{Feature, QuotaStore, Tier, TierPolicy, UsageGate, UserId};
//!
//! let gate = UsageGate::new(TierPolicy::default(), QuotaStore::with_system_clock());
//! let user = UserId::from("ana");
//! let tier = Tier::from_name_or_default("Amador");
//!
//! if gate.check_limit(&user, Feature::ChapterGeneration, tier) {
//!     // ... call the generation model ...
//!     gate.track_usage(&user, Feature::ChapterGeneration);
//! }
//! ```
//!
//! # Architecture
//!
//! - `fabula_error` - Error types
//! - `fabula_quota` - Tiers, allowances, counters, gate, persistence, config
//!
//! This crate re-exports both and ships the `fabula` operator CLI.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use fabula_error::*;
pub use fabula_quota::*;

/// Open a gate from configuration, on the system clock.
///
/// # Errors
///
/// Returns a configuration error when the allowance overrides are invalid.
pub fn gate_from_config(config: &QuotaConfig) -> FabulaResult<UsageGate> {
    let policy = TierPolicy::from_config(config)?;
    Ok(UsageGate::new(policy, QuotaStore::with_system_clock()))
}
