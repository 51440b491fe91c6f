//! Configuration error types.

/// Kinds of configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ConfigErrorKind {
    /// A configuration source could not be read or merged
    #[display("Failed to read configuration: {}", _0)]
    Source(String),
    /// The merged configuration does not match the expected shape
    #[display("Failed to parse configuration: {}", _0)]
    Parse(String),
    /// `[tiers.<name>]` names a tier that does not exist
    #[display("Unknown tier '{}' in [tiers]", _0)]
    UnknownTier(String),
    /// A tier table names a feature that does not exist
    #[display("Unknown feature '{}' in [tiers.{}]", feature, tier)]
    UnknownFeature {
        /// Tier table the key appeared in
        tier: String,
        /// Offending feature key
        feature: String,
    },
    /// An allowance value outside the accepted range
    #[display("tiers.{}.{}: invalid allowance {}", tier, feature, value)]
    InvalidAllowance {
        /// Tier table the value appeared in
        tier: String,
        /// Feature key
        feature: String,
        /// Raw configured value
        value: i64,
    },
}

/// Configuration error with source location.
///
/// # Examples
///
/// ```
/// use fabula_error::{ConfigError, ConfigErrorKind};
///
/// let err = ConfigError::new(ConfigErrorKind::UnknownTier("gold".to_string()));
/// assert!(err.to_string().contains("gold"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    /// What went wrong
    pub kind: ConfigErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new configuration error at the current location.
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }
}
