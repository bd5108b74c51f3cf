//! Configuration file parser for ~/.config/unreadstat/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted and logged at warn level.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::storage::DatabaseOptions;

/// Everything that can go wrong between the file and a usable [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config too large: {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("bad config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// How the CLI prints results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file. `None` means `<config dir>/unreadstat.db`.
    pub database_path: Option<PathBuf>,

    /// Upper bound on pooled connections.
    pub max_connections: u32,

    /// How long a read waits on a locked database before failing.
    pub busy_timeout_ms: u64,

    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            max_connections: 5,
            busy_timeout_ms: 5000,
            output: OutputFormat::Text,
        }
    }
}

impl Config {
    const SIZE_LIMIT: u64 = 1 << 20;

    const KNOWN_KEYS: [&'static str; 4] = [
        "database_path",
        "max_connections",
        "busy_timeout_ms",
        "output",
    ];

    /// Read `path`, falling back to defaults when it is absent or blank.
    ///
    /// Values of the wrong type are a [`ConfigError::Parse`]; values of the
    /// right type but out of range are a [`ConfigError::Invalid`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = Self::read_bounded(path)? else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)?;
        if let Ok(table) = content.parse::<toml::Table>() {
            table
                .keys()
                .filter(|k| !Self::KNOWN_KEYS.contains(&k.as_str()))
                .for_each(|key| tracing::warn!(%key, "Ignoring unrecognised config key"));
        }

        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// File contents, or `None` if there is no file. The size check runs on
    /// the opened handle so a swapped file cannot slip past it.
    fn read_bounded(path: &Path) -> Result<Option<String>, ConfigError> {
        use std::io::Read;

        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let size = file.metadata()?.len();
        if size > Self::SIZE_LIMIT {
            return Err(ConfigError::TooLarge {
                size,
                limit: Self::SIZE_LIMIT,
            });
        }

        let mut content = String::with_capacity(size as usize);
        file.take(Self::SIZE_LIMIT).read_to_string(&mut content)?;
        Ok(Some(content))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Database path, falling back to `unreadstat.db` inside `config_dir`
    pub fn database_path_in(&self, config_dir: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| config_dir.join("unreadstat.db"))
    }

    pub fn database_options(&self) -> DatabaseOptions {
        DatabaseOptions {
            max_connections: self.max_connections,
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}
