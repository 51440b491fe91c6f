//! Storage error types for persisted usage counters.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create the state directory
    #[display("Failed to create directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write the counter file
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to read the counter file
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Counter file could not be encoded or decoded
    #[display("Invalid counter data: {}", _0)]
    Encoding(String),
    /// Counter file was written by an incompatible version
    #[display("Unsupported snapshot version: {}", _0)]
    UnsupportedVersion(u32),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use fabula_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::FileRead("usage.json".to_string()));
/// assert!(format!("{}", err).contains("usage.json"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StorageErrorKind {
        &self.kind
    }
}
