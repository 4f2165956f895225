//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILTO_CONFIG` (environment variable)
//! 2. `~/.config/mailto/config.toml` (Linux)
//!    `~/Library/Application Support/mailto/config.toml` (macOS)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MailtoError, Result};
use crate::format::rules::{RuleTable, RuleTableConfig};
use crate::format::EscapePolicy;
use crate::search::SearchConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Contact matching thresholds.
    pub search: SearchConfig,
    /// URI formatting options.
    pub format: FormatConfig,
    /// Client rule overrides, tried before the built-in table.
    pub rules: RuleTableConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for the contact cache and logs.
    pub cache_dir: Option<PathBuf>,
    /// Override data directory for saved settings.
    pub data_dir: Option<PathBuf>,
    /// Bundle ID of the client to assume when none has been selected and
    /// the system default is unknown.
    pub default_client: Option<String>,
}

/// URI formatting options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Percent-encode `@` in encoded recipient lists.
    pub escape_at: bool,
    /// Subject line added to every composed message.
    pub subject: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
            data_dir: None,
            default_client: None,
        }
    }
}

impl FormatConfig {
    pub fn escape_policy(&self) -> EscapePolicy {
        EscapePolicy {
            escape_at: self.escape_at,
        }
    }
}

impl Config {
    /// The client rule table: built-in rules with this config's overrides.
    pub fn rule_table(&self) -> Result<RuleTable> {
        RuleTable::with_overrides(&self.rules)
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found. A file that cannot
/// be read or parsed, or whose `[rules]` do not form a usable table, is an
/// error.
pub fn load_config() -> Result<Config> {
    match config_file_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Ok(Config::default()),
    }
}

/// Load and validate the configuration file at `path`.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let invalid = |reason: String| MailtoError::InvalidConfig {
        path: path.to_path_buf(),
        reason,
    };
    let contents = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let cfg: Config = toml::from_str(&contents).map_err(|e| invalid(e.to_string()))?;
    cfg.rule_table().map_err(|e| invalid(e.to_string()))?;
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(cfg)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILTO_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("mailto").join("config.toml"))
}

/// Return the cache directory for the contact cache and logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailto")
}

/// Return the data directory for saved settings.
pub fn data_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.data_dir {
        return dir.clone();
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailto")
}

/// Contact cache written by the background updater.
pub fn contacts_cache_path(config: &Config) -> PathBuf {
    cache_dir(config).join("contacts.json")
}

/// Marker file present while the background updater runs.
pub fn contacts_updating_path(config: &Config) -> PathBuf {
    cache_dir(config).join("contacts.updating")
}

/// Saved user settings.
pub fn settings_path(config: &Config) -> PathBuf {
    data_dir(config).join("settings.json")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("mailto.log")
}
