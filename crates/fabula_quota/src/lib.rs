//! Monthly usage quotas and subscription tier gating.
//!
//! Request handlers resolve the caller's [`Tier`], ask the [`UsageGate`]
//! whether a [`Feature`] may be invoked, perform the delegated model call and
//! then record the use. Counters are kept per user and feature for the
//! current calendar month and reset lazily on the first access in a new
//! month.
//!
//! ## Components
//!
//! - [`TierPolicy`] - allowance table over every tier and feature
//! - [`QuotaStore`] - per (user, feature) counters with monthly rollover
//! - [`UsageGate`] - permission decisions on top of both
//! - [`Clock`] - injected time source ([`SystemClock`], [`ManualClock`])
//! - [`UsageRepository`] - optional persistence ([`JsonFileRepository`])
//! - [`QuotaConfig`] - layered TOML configuration
//!
//! ```
//! use fabula_quota::{Feature, QuotaStore, Tier, TierPolicy, UsageGate, UserId};
//!
//! let gate = UsageGate::new(TierPolicy::default(), QuotaStore::with_system_clock());
//! let user = UserId::from("ana");
//!
//! for _ in 0..3 {
//!     gate.try_acquire(&user, Feature::StoryGeneration, Tier::Free)?;
//! }
//! assert!(gate.try_acquire(&user, Feature::StoryGeneration, Tier::Free).is_err());
//! # Ok::<(), fabula_error::QuotaError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod allowance;
mod clock;
mod config;
mod counter;
mod gate;
mod policy;
mod repository;
mod snapshot;
mod store;
mod tier;
mod user;

pub use allowance::Allowance;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{PersistenceConfig, QuotaConfig};
pub use counter::{BillingMonth, UsageCounter};
pub use gate::{FeatureUsage, UsageGate, UsageReport};
pub use policy::{TierPolicy, builtin_allowance};
pub use repository::{JsonFileRepository, MemoryRepository, UsageRepository};
pub use snapshot::{CounterRecord, SNAPSHOT_VERSION, UsageSnapshot};
pub use store::QuotaStore;
pub use tier::{Feature, Tier};
pub use user::UserId;
