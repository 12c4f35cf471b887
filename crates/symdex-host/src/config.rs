//! Host configuration loading from file and environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use symdex_db::IndexPreferences;
use thiserror::Error;

/// Top-level host configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Index store settings.
    #[serde(default)]
    pub index: IndexConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the index lives and how it is opened.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexConfig {
    /// Directory holding the database files. Defaults to the XDG state
    /// directory.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Store preferences, given inline in the `[index]` table.
    #[serde(flatten)]
    pub preferences: IndexPreferences,
}

impl IndexConfig {
    /// The configured state directory, or the platform default.
    pub fn resolved_state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(default_state_dir)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "symdex_db=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// `$XDG_STATE_HOME/symdex`, falling back to `~/.local/state/symdex`.
pub fn default_state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("state")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("symdex")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `SYMDEX_STATE_DIR` overrides `index.state_dir`
/// - `SYMDEX_POOL_MAX_SIZE` overrides `index.pool_max_size`
/// - `SYMDEX_LOG_LEVEL` overrides `logging.level`
/// - `SYMDEX_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %p.display(), "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies `SYMDEX_*` overrides read through `lookup`.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(dir) = lookup("SYMDEX_STATE_DIR").filter(|v| !v.trim().is_empty()) {
        config.index.state_dir = Some(PathBuf::from(dir));
    }
    if let Some(size) = lookup("SYMDEX_POOL_MAX_SIZE") {
        if let Ok(parsed) = size.parse() {
            config.index.preferences.pool_max_size = parsed;
        }
    }
    if let Some(level) = lookup("SYMDEX_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("SYMDEX_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
