//! Configuration for mediastash.
//!
//! This module provides TOML-based configuration. The configuration system supports:
//! - Bundled defaults (include_str! from mediastash.toml)
//! - User overrides (./mediastash.toml or ~/.config/mediastash/mediastash.toml)
//! - Automatic merging with user values taking precedence

use config::{Config, File, FileFormat};
use derive_getters::Getters;
use derive_setters::Setters;
use mediastash_core::Volume;
use mediastash_error::{ConfigError, MediaStashError, MediaStashResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration
const DEFAULT_CONFIG: &str = include_str!("../../../mediastash.toml");

const APP_DIR: &str = "mediastash";

/// Content index settings.
///
/// ```toml
/// [index]
/// root = "/var/lib/mediastash"
/// volume = "external_primary"
/// pending_ttl_secs = 604800
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct IndexConfig {
    /// Root directory of the index (platform data dir when unset)
    #[serde(default)]
    #[setters(strip_option, into)]
    root: Option<PathBuf>,

    /// Volume new entries are published on
    #[serde(default = "default_volume")]
    #[setters(into)]
    volume: String,

    /// Seconds a pending entry may linger before it is purged
    #[serde(default = "default_pending_ttl_secs")]
    pending_ttl_secs: u64,
}

fn default_volume() -> String {
    Volume::EXTERNAL_PRIMARY.to_string()
}

fn default_pending_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root: None,
            volume: default_volume(),
            pending_ttl_secs: default_pending_ttl_secs(),
        }
    }
}

impl IndexConfig {
    /// Pending TTL as a duration.
    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_secs)
    }
}

/// Publisher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct PublisherConfig {
    /// JPEG quality for bitmaps (1-100)
    #[serde(default = "default_jpeg_quality")]
    jpeg_quality: u8,
}

fn default_jpeg_quality() -> u8 {
    100
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Bundled resource settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct ResourcesConfig {
    /// Directory for materialized resources (platform cache dir when unset)
    #[serde(default)]
    #[setters(strip_option, into)]
    cache_dir: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct LoggingConfig {
    /// Level filter (e.g. "info", "mediastash_index=debug")
    #[serde(default = "default_level")]
    #[setters(into)]
    level: String,

    /// Emit JSON lines instead of plain text
    #[serde(default)]
    json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

/// Top-level mediastash configuration.
///
/// Loads from TOML files with a precedence system:
/// 1. Bundled defaults (include_str! from mediastash.toml)
/// 2. User override (./mediastash.toml or ~/.config/mediastash/mediastash.toml)
///
/// # Example
///
/// ```no_run
/// use mediastash::MediaStashConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = MediaStashConfig::load()?;
/// println!("Publishing to volume {}", config.index().volume());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct MediaStashConfig {
    /// Content index settings
    #[serde(default)]
    index: IndexConfig,

    /// Publisher settings
    #[serde(default)]
    publisher: PublisherConfig,

    /// Bundled resource settings
    #[serde(default)]
    resources: ResourcesConfig,

    /// Logging settings
    #[serde(default)]
    logging: LoggingConfig,
}

impl MediaStashConfig {
    /// Load configuration from a specific file path, layered over the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> MediaStashResult<Self> {
        debug!("Loading configuration from file");

        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()));

        Self::build(builder)
    }

    /// Parse configuration from a TOML string, layered over the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid configuration.
    pub fn from_toml_str(toml: &str) -> MediaStashResult<Self> {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(toml, FileFormat::Toml));

        Self::build(builder)
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override earlier):
    /// 1. Bundled defaults (mediastash.toml shipped with the library)
    /// 2. User config in home directory (~/.config/mediastash/mediastash.toml)
    /// 3. User config in current directory (./mediastash.toml)
    ///
    /// User config files are optional and will be silently skipped if not found.
    #[instrument]
    pub fn load() -> MediaStashResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/mediastash/mediastash.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name(APP_DIR).required(false));

        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> MediaStashResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| {
                MediaStashError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                MediaStashError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error for a JPEG quality outside 1-100, a zero pending TTL,
    /// or an empty volume name.
    pub fn validate(&self) -> MediaStashResult<()> {
        let quality = self.publisher.jpeg_quality;
        if !(1..=100).contains(&quality) {
            return Err(ConfigError::invalid_value(
                "publisher",
                "jpeg_quality",
                format_args!("must be in 1..=100, got {}", quality),
            )
            .into());
        }
        if self.index.pending_ttl_secs == 0 {
            return Err(
                ConfigError::invalid_value("index", "pending_ttl_secs", "must be greater than 0")
                    .into(),
            );
        }
        if self.index.volume.trim().is_empty() {
            return Err(ConfigError::invalid_value("index", "volume", "must not be empty").into());
        }
        Ok(())
    }

    /// Index root, falling back to `<data dir>/mediastash`.
    ///
    /// # Errors
    ///
    /// Returns an error if no root is configured and the platform has no data dir.
    pub fn index_root(&self) -> MediaStashResult<PathBuf> {
        match &self.index.root {
            Some(root) => Ok(root.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| ConfigError::new("No index root configured and no data dir").into()),
        }
    }

    /// Resource cache directory, falling back to `<cache dir>/mediastash`.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the platform has no cache dir.
    pub fn cache_dir(&self) -> MediaStashResult<PathBuf> {
        match &self.resources.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::cache_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| ConfigError::new("No cache dir configured and no platform cache dir").into()),
        }
    }
}
