//! Top-level error wrapper types.

use crate::{ConfigError, QuotaError, StorageError};

/// Every error condition surfaced by the Fabula crates.
///
/// # Examples
///
/// ```
/// use fabula_error::{ConfigError, ConfigErrorKind, FabulaError};
///
/// let err: FabulaError = ConfigError::new(ConfigErrorKind::Parse("bad value".into())).into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum FabulaErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Counter persistence error
    #[from(StorageError)]
    Storage(StorageError),
    /// Quota denial or invalid quota input
    #[from(QuotaError)]
    Quota(QuotaError),
}

/// Fabula error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Fabula Error: {}", _0)]
pub struct FabulaError(Box<FabulaErrorKind>);

impl FabulaError {
    /// Create a new error from a kind.
    pub fn new(kind: FabulaErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FabulaErrorKind {
        &self.0
    }
}

impl<T> From<T> for FabulaError
where
    T: Into<FabulaErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Fabula operations.
pub type FabulaResult<T> = std::result::Result<T, FabulaError>;
