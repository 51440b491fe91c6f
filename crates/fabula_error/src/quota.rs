//! Quota error types.

/// Specific quota error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum QuotaErrorKind {
    /// The tier has no access to the feature at all
    #[display("Tier '{}' has no access to '{}'", tier, feature)]
    NoAccess {
        /// Tier name
        tier: String,
        /// Feature key
        feature: String,
    },

    /// The monthly allowance is used up
    #[display("Monthly limit reached for '{}': {} of {} used", feature, used, allowance)]
    LimitReached {
        /// Feature key
        feature: String,
        /// Units used in the current window
        used: u64,
        /// Monthly allowance for the tier
        allowance: u32,
    },

    /// Feature key is not one of the known features
    #[display("Unknown feature: {}", _0)]
    UnknownFeature(String),

    /// Raw allowance value outside the accepted range
    #[display("Invalid allowance {} (expected -1, 0 or a positive count)", _0)]
    InvalidAllowance(i64),
}

impl QuotaErrorKind {
    /// Whether this kind is a denial of an otherwise valid request.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            QuotaErrorKind::NoAccess { .. } | QuotaErrorKind::LimitReached { .. }
        )
    }
}

/// Quota error with location tracking.
///
/// # Examples
///
/// ```
/// use fabula_error::{QuotaError, QuotaErrorKind};
///
/// let err = QuotaError::new(QuotaErrorKind::UnknownFeature("poetry".to_string()));
/// assert!(!err.kind().is_denial());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Quota Error: {} at line {} in {}", kind, line, file)]
pub struct QuotaError {
    /// The specific error kind
    pub kind: QuotaErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl QuotaError {
    /// Create a new quota error with location tracking.
    #[track_caller]
    pub fn new(kind: QuotaErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &QuotaErrorKind {
        &self.kind
    }
}

/// Result type for quota operations.
pub type QuotaResult<T> = Result<T, QuotaError>;
