//! Error types for the Fabula quota library.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! A denied quota check is not an error. Only the atomic acquire path reports
//! denials through [`QuotaError`].
//!
//! # Examples
//!
//! ```
//! use fabula_error::{ConfigError, ConfigErrorKind, FabulaResult};
//!
//! fn load() -> FabulaResult<()> {
//!     Err(ConfigError::new(ConfigErrorKind::Parse("missing [tiers] table".into())))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod quota;
mod storage;

pub use config::{ConfigError, ConfigErrorKind};
pub use error::{FabulaError, FabulaErrorKind, FabulaResult};
pub use quota::{QuotaError, QuotaErrorKind, QuotaResult};
pub use storage::{StorageError, StorageErrorKind};
