//! # Application Configuration
//!
//! Settings for the `oto` library tool, read from a TOML file or assembled
//! with a builder.
//!
//! ## Overview
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. The builder validates fail-fast and reports
//! actionable messages through [`Error::Config`].
//!
//! ## File format
//!
//! ```toml
//! database_path = "/home/me/.local/share/oto/db.sqlite"
//! enforce_foreign_keys = true
//! import_batch_size = 64
//! music_dirs = ["/home/me/Music"]
//!
//! [logging]
//! level = "debug"
//! format = "compact"
//! ```
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::builder()
//!     .database_path("/tmp/oto.sqlite")
//!     .import_batch_size(128)
//!     .build()?;
//! assert_eq!(config.import_batch_size, 128);
//! # Ok::<(), core_runtime::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for platform data and config directories
pub const APP_NAME: &str = "oto";

/// Tracks per import transaction unless configured otherwise
pub const DEFAULT_IMPORT_BATCH_SIZE: usize = 64;

const DATABASE_FILE: &str = "db.sqlite";
const CONFIG_FILE: &str = "config.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// `<data dir>/oto/db.sqlite`, or `./db.sqlite` when no home directory is known
pub fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}

/// `<config dir>/oto/config.toml`, if a home directory is known
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn default_import_batch_size() -> usize {
    DEFAULT_IMPORT_BATCH_SIZE
}

fn default_true() -> bool {
    true
}

/// Runtime settings for the library tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Reject media rows that reference a missing album
    #[serde(default = "default_true")]
    pub enforce_foreign_keys: bool,

    /// Imported tracks per committed transaction
    #[serde(default = "default_import_batch_size")]
    pub import_batch_size: usize,

    /// Folders scanned when no folder is given explicitly
    #[serde(default)]
    pub music_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            enforce_foreign_keys: true,
            import_batch_size: DEFAULT_IMPORT_BATCH_SIZE,
            music_dirs: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Creates a new builder starting from the defaults
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Read and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `path` if given, else the platform config file if it exists,
    /// else the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.import_batch_size == 0 {
            return Err(Error::Config(
                "Import batch size must be greater than 0".to_string(),
            ));
        }

        if let Some(dir) = self.music_dirs.iter().find(|d| d.as_os_str().is_empty()) {
            return Err(Error::Config(format!(
                "Music directory entry cannot be empty: {:?}",
                dir
            )));
        }

        Ok(())
    }
}

/// Builder for [`AppConfig`]
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    database_path: Option<PathBuf>,
    enforce_foreign_keys: Option<bool>,
    import_batch_size: Option<usize>,
    music_dirs: Vec<PathBuf>,
    logging: Option<LoggingConfig>,
}

impl AppConfigBuilder {
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn enforce_foreign_keys(mut self, enforce: bool) -> Self {
        self.enforce_foreign_keys = Some(enforce);
        self
    }

    pub fn import_batch_size(mut self, size: usize) -> Self {
        self.import_batch_size = Some(size);
        self
    }

    /// Add a folder to scan; may be called repeatedly
    pub fn music_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.music_dirs.push(dir.into());
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds the configuration, filling unset fields with defaults
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when a value fails validation.
    pub fn build(self) -> Result<AppConfig> {
        let config = AppConfig {
            database_path: self.database_path.unwrap_or_else(default_database_path),
            enforce_foreign_keys: self.enforce_foreign_keys.unwrap_or(true),
            import_batch_size: self
                .import_batch_size
                .unwrap_or(DEFAULT_IMPORT_BATCH_SIZE),
            music_dirs: self.music_dirs,
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
