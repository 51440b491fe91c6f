//! Tier allowance table.
//!
//! The table is total over [`Tier`] × [`Feature`]: every pair has an
//! allowance, so a lookup can never miss. Unrecognized tier names are
//! resolved to the most restrictive tier before they reach the table, and
//! configuration naming an unknown tier or feature is rejected at load time.

use crate::{Allowance, Feature, QuotaConfig, Tier};
use fabula_error::{ConfigError, ConfigErrorKind, FabulaResult};
use strum::{EnumCount, IntoEnumIterator};
use tracing::{debug, instrument};

type AllowanceTable = [[Allowance; Feature::COUNT]; Tier::COUNT];

/// Built-in monthly allowances.
///
/// | Feature               | Free | Amador | Profissional |
/// |-----------------------|------|--------|--------------|
/// | story_generation      | 3    | 10     | unlimited    |
/// | chapter_generation    | 5    | 50     | unlimited    |
/// | character_generation  | 5    | 30     | unlimited    |
/// | cover_generation      | 0    | 5      | 50           |
/// | chat                  | 20   | 200    | unlimited    |
/// | export                | 0    | 10     | unlimited    |
/// | screenplay_generation | 0    | 3      | 30           |
/// | audio_narration       | 0    | 2      | 20           |
pub fn builtin_allowance(tier: Tier, feature: Feature) -> Allowance {
    use Allowance::{Limited, NoAccess, Unlimited};
    use Feature::*;

    match tier {
        Tier::Free => match feature {
            StoryGeneration => Limited(3),
            ChapterGeneration => Limited(5),
            CharacterGeneration => Limited(5),
            CoverGeneration => NoAccess,
            Chat => Limited(20),
            Export => NoAccess,
            ScreenplayGeneration => NoAccess,
            AudioNarration => NoAccess,
        },
        Tier::Amador => match feature {
            StoryGeneration => Limited(10),
            ChapterGeneration => Limited(50),
            CharacterGeneration => Limited(30),
            CoverGeneration => Limited(5),
            Chat => Limited(200),
            Export => Limited(10),
            ScreenplayGeneration => Limited(3),
            AudioNarration => Limited(2),
        },
        Tier::Profissional => match feature {
            StoryGeneration => Unlimited,
            ChapterGeneration => Unlimited,
            CharacterGeneration => Unlimited,
            CoverGeneration => Limited(50),
            Chat => Unlimited,
            Export => Unlimited,
            ScreenplayGeneration => Limited(30),
            AudioNarration => Limited(20),
        },
    }
}

/// Lookup from (tier, feature) to monthly allowance.
///
/// # Example
///
/// ```
/// use fabula_quota::{Allowance, Feature, Tier, TierPolicy};
///
/// let policy = TierPolicy::default();
/// assert_eq!(
///     policy.allowance_for(Tier::Amador, Feature::StoryGeneration),
///     Allowance::Limited(10)
/// );
/// // Unknown tiers get the Free allowances.
/// assert_eq!(
///     policy.allowance_for_name("gold", Feature::CoverGeneration),
///     Allowance::NoAccess
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPolicy {
    table: AllowanceTable,
}

impl TierPolicy {
    /// Policy with the built-in allowances.
    pub fn builtin() -> Self {
        let mut table = [[Allowance::NoAccess; Feature::COUNT]; Tier::COUNT];
        for tier in Tier::iter() {
            for feature in Feature::iter() {
                table[tier.index()][feature.index()] = builtin_allowance(tier, feature);
            }
        }
        Self { table }
    }

    /// Built-in allowances overlaid with the `[tiers]` section of `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown tier or feature names and
    /// for allowance values below `-1`.
    #[instrument(skip_all)]
    pub fn from_config(config: &QuotaConfig) -> FabulaResult<Self> {
        let mut policy = Self::builtin();

        for (tier_name, features) in &config.tiers {
            let tier: Tier = tier_name.parse().map_err(|_| {
                ConfigError::new(ConfigErrorKind::UnknownTier(tier_name.clone()))
            })?;

            for (feature_name, raw) in features {
                let feature: Feature = feature_name.parse().map_err(|_| {
                    ConfigError::new(ConfigErrorKind::UnknownFeature {
                        tier: tier_name.clone(),
                        feature: feature_name.clone(),
                    })
                })?;
                let allowance = Allowance::try_from(*raw).map_err(|_| {
                    ConfigError::new(ConfigErrorKind::InvalidAllowance {
                        tier: tier_name.clone(),
                        feature: feature_name.clone(),
                        value: *raw,
                    })
                })?;

                debug!(%tier, %feature, %allowance, "Applying configured allowance");
                policy = policy.with_allowance(tier, feature, allowance);
            }
        }

        Ok(policy)
    }

    /// Replace one entry.
    pub fn with_allowance(mut self, tier: Tier, feature: Feature, allowance: Allowance) -> Self {
        self.table[tier.index()][feature.index()] = allowance;
        self
    }

    /// Monthly allowance for a tier and feature.
    pub fn allowance_for(&self, tier: Tier, feature: Feature) -> Allowance {
        self.table[tier.index()][feature.index()]
    }

    /// Monthly allowance for a tier name from the authentication layer.
    ///
    /// Unknown names use the most restrictive tier.
    pub fn allowance_for_name(&self, tier_name: &str, feature: Feature) -> Allowance {
        self.allowance_for(Tier::from_name_or_default(tier_name), feature)
    }

    /// Every (tier, feature, allowance) entry, tier-major.
    pub fn rows(&self) -> impl Iterator<Item = (Tier, Feature, Allowance)> + '_ {
        Tier::iter().flat_map(move |tier| {
            Feature::iter().map(move |feature| (tier, feature, self.allowance_for(tier, feature)))
        })
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}
