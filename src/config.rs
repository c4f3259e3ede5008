//! Application configuration.
//!
//! Settings are layered with figment, later sources winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`config.toml` in the platform config dir, or `--config FILE`)
//! 3. `HASHDUPE_*` environment variables (e.g. `HASHDUPE_IO_THREADS=8`)
//! 4. Command-line flags, applied by the caller
//!
//! ```toml
//! io_threads = 8
//! chunk_size = 131072
//! skip_hidden = true
//! ignore_patterns = ["target/", "*.tmp"]
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::{DEFAULT_BATCH_SIZE, DEFAULT_IO_THREADS};
use crate::scanner::DEFAULT_CHUNK_SIZE;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "HASHDUPE_";

/// Errors raised while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file or environment contained invalid values.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

/// Persistent scan settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hashing threads; 1 disables parallel hashing.
    pub io_threads: usize,
    /// Read buffer size in bytes.
    pub chunk_size: usize,
    /// Files hashed per parallel batch.
    pub batch_size: usize,
    /// Skip dot files and dot directories.
    pub skip_hidden: bool,
    /// Extra gitignore-style patterns.
    pub ignore_patterns: Vec<String>,
    /// Apply the `.gitignore` at the scan root.
    pub respect_gitignore: bool,
    /// Maximum traversal depth.
    pub max_depth: Option<usize>,
    /// Abort on the first unreadable file or directory.
    pub strict: bool,
    /// Show progress bars.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            respect_gitignore: false,
            max_depth: None,
            strict: false,
            progress: true,
        }
    }
}

impl Config {
    /// Load from the default config file and environment.
    ///
    /// Any error is logged and the defaults are used instead.
    #[must_use]
    pub fn load() -> Self {
        let figment = match Self::default_path() {
            Some(path) => Self::figment(Some(&path)),
            None => Self::figment(None),
        };
        match figment.extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring invalid configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load from an explicit config file plus environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `path` does not exist, or
    /// [`ConfigError::Invalid`] if it cannot be parsed.
    pub fn try_load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let config = Self::figment(Some(path)).extract()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// The provider chain without CLI overrides.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Platform-specific location of `config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "hashdupe", "hashdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
