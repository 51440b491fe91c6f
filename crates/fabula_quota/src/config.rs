//! Configuration for tier allowances and counter persistence.
//!
//! Sources, later ones overriding earlier ones:
//! - Bundled defaults (include_str! from fabula.toml)
//! - `~/.config/fabula/fabula.toml`
//! - `./fabula.toml`

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, File, FileFormat};
use fabula_error::{ConfigError, ConfigErrorKind, FabulaResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Where usage counters are persisted between runs.
///
/// ```toml
/// [persistence]
/// path = "/var/lib/fabula/usage.json"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct PersistenceConfig {
    /// Counter file. When unset, counters live only as long as the process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Top-level quota configuration.
///
/// Allowance overrides are keyed by lowercase tier name, then feature key.
/// Raw values follow the allowance convention: `-1` unlimited, `0` no access.
///
/// ```toml
/// [tiers.amador]
/// story_generation = 10
/// cover_generation = 5
///
/// [tiers.profissional]
/// chapter_generation = -1
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct QuotaConfig {
    /// Allowance overrides: tier name → feature key → raw allowance
    #[serde(default)]
    pub tiers: HashMap<String, HashMap<String, i64>>,

    /// Counter persistence settings
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl QuotaConfig {
    /// Load configuration from a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> FabulaResult<Self> {
        debug!("Loading configuration from file");
        Self::merge(Config::builder().add_source(File::from(path.as_ref())))
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid configuration TOML.
    pub fn from_toml_str(toml: &str) -> FabulaResult<Self> {
        Self::merge(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// User files are optional and skipped when absent.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fabula_quota::QuotaConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = QuotaConfig::load()?;
    /// println!("persisting to {:?}", config.persistence.path);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument]
    pub fn load() -> FabulaResult<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(Self::bundled(), FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/fabula/fabula.toml");
            debug!(path = %home_config.display(), "Adding user configuration layer");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        Self::merge(builder.add_source(File::with_name("fabula").required(false)))
    }

    /// Merge every layer of `builder` and deserialize the result.
    fn merge(builder: ConfigBuilder<DefaultState>) -> FabulaResult<Self> {
        let merged = builder
            .build()
            .map_err(|e| ConfigError::new(ConfigErrorKind::Source(e.to_string())))?;
        let config = merged
            .try_deserialize()
            .map_err(|e| ConfigError::new(ConfigErrorKind::Parse(e.to_string())))?;
        Ok(config)
    }

    /// The configuration shipped with the library.
    pub fn bundled() -> &'static str {
        include_str!("../../../fabula.toml")
    }
}
