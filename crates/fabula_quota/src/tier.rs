//! Subscription tiers and quota-limited features.

use fabula_error::{QuotaError, QuotaErrorKind, QuotaResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Subscription level determining feature allowances.
///
/// Tier names are parsed case-insensitively, so `"amador"` and `"Amador"`
/// resolve to the same tier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::EnumCount,
)]
#[strum(ascii_case_insensitive)]
pub enum Tier {
    /// Unpaid accounts
    Free,
    /// Hobbyist plan
    Amador,
    /// Professional plan
    Profissional,
}

impl Tier {
    /// The tier with the smallest allowances. Unrecognized tiers fall back to it.
    pub fn most_restrictive() -> Self {
        Tier::Free
    }

    /// Resolve a tier name from the authentication layer.
    ///
    /// Never fails: an unknown name resolves to [`Tier::most_restrictive`].
    ///
    /// ```
    /// use fabula_quota::Tier;
    ///
    /// assert_eq!(Tier::from_name_or_default("PROFISSIONAL"), Tier::Profissional);
    /// assert_eq!(Tier::from_name_or_default("platinum"), Tier::Free);
    /// ```
    pub fn from_name_or_default(name: &str) -> Self {
        name.trim().parse().unwrap_or_else(|_| {
            let fallback = Tier::most_restrictive();
            warn!(tier = name, %fallback, "Unknown tier, using most restrictive allowances");
            fallback
        })
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// A rate-limited capability of the writing assistant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::EnumCount,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Full story drafts
    StoryGeneration,
    /// Single chapters
    ChapterGeneration,
    /// Character sheets
    CharacterGeneration,
    /// Book cover images
    CoverGeneration,
    /// Conversational assistant
    Chat,
    /// Document export
    Export,
    /// Screenplay conversion
    ScreenplayGeneration,
    /// Text-to-speech narration
    AudioNarration,
}

impl Feature {
    /// Parse a feature key from the routing layer.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaErrorKind::UnknownFeature`] for keys outside the closed set.
    pub fn parse_key(key: &str) -> QuotaResult<Self> {
        key.trim()
            .parse()
            .map_err(|_| QuotaError::new(QuotaErrorKind::UnknownFeature(key.to_string())))
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}
