use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::flags::WordPreference;
use crate::core::node::GameMode;
use crate::core::resolver::PathOptions;
use crate::core::verify::RetryPolicy;
use crate::database::DEFAULT_DB_FILE;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub path_finder: PathFinderConfig,
    pub verification: VerificationConfig,
    pub logging: LoggingConfig,
}

/// Dictionary database location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
    pub file_name: String,
    pub max_connections: u32,
}

/// Next-word selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathFinderConfig {
    pub mode: GameMode,
    /// Category order, encoded as `5,1,6,2,4,0`.
    pub preference: WordPreference,
    pub end_word: bool,
    pub attack_word: bool,
    /// Allow words that were already played this game.
    pub return_mode: bool,
    pub max_candidates: u32,
    /// Typing delay per character; no time filtering when unset.
    pub delay_per_char_ms: Option<u64>,
}

/// Online dictionary verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Dictionary endpoint; verification is unavailable when unset.
    pub base_url: Option<String>,
    pub settle_delay_ms: u64,
    pub max_attempts: u32,
    pub timeout_ms: u64,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    pub level: String,
    pub log_dir: Option<PathBuf>,
    /// Echo logs to the console in addition to the log file.
    pub console: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            file_name: DEFAULT_DB_FILE.to_string(),
            max_connections: 5,
        }
    }
}

impl Default for PathFinderConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Standard,
            preference: WordPreference::default(),
            end_word: true,
            attack_word: true,
            return_mode: false,
            max_candidates: 128,
            delay_per_char_ms: None,
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            settle_delay_ms: 1500,
            max_attempts: 5,
            timeout_ms: 10_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            console: true,
        }
    }
}

impl PathFinderConfig {
    pub fn options(&self) -> PathOptions {
        PathOptions {
            use_end_word: self.end_word,
            use_attack_word: self.attack_word,
            manual_search: false,
        }
    }
}

impl VerificationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/wordchain/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match Self::from_path(&config_path) {
            Ok(config) => {
                log::info!("Loaded config from {}", config_path.display());
                config
            }
            Err(ConfigError::Read { .. }) => {
                log::debug!("No config file at {}, using defaults", config_path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.database.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("wordchain"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    /// Full path of the dictionary database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(&self.database.file_name)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("wordchain").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
