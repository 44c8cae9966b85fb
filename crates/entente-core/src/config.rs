//! Configuration loading and typed config structures for the Entente engine.
//!
//! The canonical configuration lives in `entente-config.yaml` at the
//! project root. Every field has a default, so a missing file or a partial
//! file is valid.

use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::Deserialize;

use entente_diplomacy::ExpiryPolicy;

/// Environment variable overriding `storage.data_dir`.
pub const DATA_DIR_ENV: &str = "ENTENTE_DATA_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `entente-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EntenteConfig {
    /// Where state files live.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Costs, cooldowns, and durations of diplomatic actions.
    #[serde(default)]
    pub diplomacy: DiplomacyConfig,

    /// Expiration sweeper timing.
    #[serde(default)]
    pub sweeper: SweeperConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EntenteConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `ENTENTE_DATA_DIR` overrides `storage.data_dir` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load the file at `path` if it exists, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Same as [`EntenteConfig::from_file`] for a file that exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        tracing::info!(path = %path.display(), "Config file not found, using defaults");
        let mut config = Self::default();
        config.storage.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.storage.apply_env_overrides();
        Ok(config)
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Root directory for relation, sanction, and nation files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Override the data directory with `ENTENTE_DATA_DIR` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(val);
        }
    }

    /// Directory holding one file per nation.
    pub fn nations_dir(&self) -> PathBuf {
        self.data_dir.join("nations")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Diplomacy rules configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiplomacyConfig {
    /// Treasury cost of declaring war.
    #[serde(default = "default_war_cost")]
    pub war_cost: Decimal,

    /// Hours a nation must wait between war declarations.
    #[serde(default = "default_war_cooldown_hours")]
    pub war_cooldown_hours: u32,

    /// Hours a war lasts when no duration is given.
    #[serde(default = "default_war_duration_hours")]
    pub war_duration_hours: u32,

    /// Wars with no explicit duration never expire.
    #[serde(default)]
    pub permanent_wars: bool,

    /// Escalation mode: declared wars are permanent until peace.
    #[serde(default)]
    pub advanced_war: bool,

    /// Reputation each side loses when an alliance is broken.
    #[serde(default = "default_alliance_break_penalty")]
    pub alliance_break_penalty: i32,
}

impl DiplomacyConfig {
    /// The cooldown between war declarations.
    pub fn war_cooldown(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.war_cooldown_hours))
    }

    /// Expiry defaults derived from this configuration.
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy {
            war_default: TimeDelta::hours(i64::from(self.war_duration_hours)),
            permanent_wars: self.permanent_wars,
        }
    }
}

impl Default for DiplomacyConfig {
    fn default() -> Self {
        Self {
            war_cost: default_war_cost(),
            war_cooldown_hours: default_war_cooldown_hours(),
            war_duration_hours: default_war_duration_hours(),
            permanent_wars: false,
            advanced_war: false,
            alliance_break_penalty: default_alliance_break_penalty(),
        }
    }
}

/// Expiration sweeper configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SweeperConfig {
    /// Seconds between sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
}

impl SweeperConfig {
    /// The sweep period, never shorter than one second.
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_war_cost() -> Decimal {
    Decimal::new(5000, 0)
}

const fn default_war_cooldown_hours() -> u32 {
    72
}

const fn default_war_duration_hours() -> u32 {
    24
}

const fn default_alliance_break_penalty() -> i32 {
    entente_diplomacy::reputation::ALLIANCE_BREAK_PENALTY
}

const fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_owned()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults_match_game_rules() {
        let config = EntenteConfig::default();
        assert_eq!(config.diplomacy.war_cost, Decimal::new(5000, 0));
        assert_eq!(config.diplomacy.war_cooldown(), TimeDelta::hours(72));
        assert_eq!(config.diplomacy.expiry_policy(), ExpiryPolicy::default());
        assert_eq!(config.diplomacy.alliance_break_penalty, 20);
        assert_eq!(config.sweeper.interval(), std::time::Duration::from_secs(300));
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
diplomacy:
  war_cost: 250
  advanced_war: true
sweeper:
  interval_secs: 0
logging:
  level: debug
  format: json
";
        let config = EntenteConfig::parse(yaml).unwrap();
        assert_eq!(config.diplomacy.war_cost, Decimal::new(250, 0));
        assert!(config.diplomacy.advanced_war);
        assert_eq!(config.diplomacy.war_cooldown_hours, 72);
        assert_eq!(config.sweeper.interval(), std::time::Duration::from_secs(1));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = EntenteConfig::parse("").unwrap();
        assert_eq!(config.diplomacy, DiplomacyConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = EntenteConfig::parse("diplomacy: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EntenteConfig::load_or_default(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.sweeper, SweeperConfig::default());
    }
}
