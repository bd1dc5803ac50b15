//! Configuration loading and parsing.
//!
//! Parses `inkstone.toml`, discovered in the working directory first and the
//! platform config directory second. Every field has a serde default and
//! unknown fields are ignored, so configs written against newer or older
//! versions still load. A file that fails to parse degrades to the defaults
//! rather than failing session startup.

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

/// Cursor-proximity suggestion tuning.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SuggestConfig {
    /// Scan window half-width in bytes around the caret.
    #[serde(default = "SuggestConfig::default_radius")]
    pub radius: usize,
    /// Debounce delay before a scan runs after the caret settles.
    #[serde(default = "SuggestConfig::default_delay_ms")]
    pub delay_ms: u64,
}

impl SuggestConfig {
    const fn default_radius() -> usize {
        160
    }
    const fn default_delay_ms() -> u64 {
        300
    }
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            delay_ms: Self::default_delay_ms(),
        }
    }
}

/// Undo history tuning.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Window inside which consecutive small edits coalesce into one step.
    #[serde(default = "HistoryConfig::default_coalesce_ms")]
    pub coalesce_ms: u64,
    /// Maximum retained snapshots.
    #[serde(default = "HistoryConfig::default_max_depth")]
    pub max_depth: usize,
}

impl HistoryConfig {
    const fn default_coalesce_ms() -> u64 {
        1000
    }
    const fn default_max_depth() -> usize {
        200
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            coalesce_ms: Self::default_coalesce_ms(),
            max_depth: Self::default_max_depth(),
        }
    }
}

/// Deferred persistence tuning.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PersistConfig {
    /// Debounce delay before a snapshot write after edits settle.
    #[serde(default = "PersistConfig::default_delay_ms")]
    pub delay_ms: u64,
}

impl PersistConfig {
    const fn default_delay_ms() -> u64 {
        800
    }
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            delay_ms: Self::default_delay_ms(),
        }
    }
}

/// Raw file shape; see the crate docs for tolerance rules.
#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub suggest: SuggestConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub persist: PersistConfig,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub file: ConfigFile,
}

impl Config {
    pub fn suggest_delay(&self) -> Duration {
        Duration::from_millis(self.file.suggest.delay_ms)
    }
    pub fn persist_delay(&self) -> Duration {
        Duration::from_millis(self.file.persist.delay_ms)
    }
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.file.history.coalesce_ms)
    }
}

/// Best-effort config path: working directory first, then the platform
/// config dir (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("inkstone.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("inkstone").join("inkstone.toml");
    }
    PathBuf::from("inkstone.toml")
}

/// Load configuration from `path`, or from `discover()` when `None`.
/// A missing file yields the defaults; a malformed file logs and yields the
/// defaults.
pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => {
                info!(target: "config", file = %path.display(), "config_loaded");
                Ok(Config { file })
            }
            Err(e) => {
                warn!(target: "config", file = %path.display(), error = %e, "config_parse_failed_using_defaults");
                Ok(Config::default())
            }
        },
        Err(_) => Ok(Config::default()),
    }
}
