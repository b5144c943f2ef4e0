//! Daemon settings.
//!
//! Settings are read from `~/.breath-coach/config.json` when that file
//! exists. Every field has a default, so a partial file is valid and a
//! missing file yields [`Settings::default`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patterns::{self, DEFAULT_PATTERN_ID, DEFAULT_TARGET_ROUNDS};
use crate::types::{
    SessionConfig, DEFAULT_FOCUS_MINUTES, MAX_FOCUS_MINUTES, MAX_TARGET_ROUNDS, MIN_FOCUS_MINUTES,
    MIN_TARGET_ROUNDS,
};

/// Directory under the home directory holding all Breath Coach files.
pub const APP_DIR_NAME: &str = ".breath-coach";

const CONFIG_FILE_NAME: &str = "config.json";
const SOCKET_FILE_NAME: &str = "breath-coach.sock";
const HISTORY_FILE_NAME: &str = "history.json";

/// Accepted tick interval range in milliseconds.
const TICK_INTERVAL_RANGE_MS: std::ops::RangeInclusive<u64> = 10..=1000;

// ============================================================================
// ConfigError
// ============================================================================

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("target rounds must be between {MIN_TARGET_ROUNDS} and {MAX_TARGET_ROUNDS}, got {0}")]
    TargetRoundsOutOfRange(u32),

    #[error("focus length must be between {MIN_FOCUS_MINUTES} and {MAX_FOCUS_MINUTES} minutes, got {0}")]
    FocusMinutesOutOfRange(u32),

    #[error("unknown breathing pattern '{0}' (see `breath-coach patterns`)")]
    UnknownPattern(String),

    #[error("tick interval must be between 10 and 1000 ms, got {0}")]
    TickIntervalOutOfRange(u64),

    #[error("home directory could not be determined")]
    HomeNotFound,

    #[error("failed to read config file {0}: {1}")]
    Read(String, String),

    #[error("failed to parse config file {0}: {1}")]
    Parse(String, String),
}

// ============================================================================
// Settings
// ============================================================================

fn default_pattern() -> String {
    DEFAULT_PATTERN_ID.to_string()
}

fn default_target_rounds() -> u32 {
    DEFAULT_TARGET_ROUNDS
}

fn default_haptics() -> bool {
    true
}

fn default_focus_minutes() -> u32 {
    DEFAULT_FOCUS_MINUTES
}

fn default_tick_interval_ms() -> u64 {
    50
}

/// Daemon-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Pattern used when `start` names none.
    #[serde(default = "default_pattern")]
    pub default_pattern: String,

    /// Target rounds used when `start` names none.
    #[serde(default = "default_target_rounds")]
    pub default_target_rounds: u32,

    /// Whether haptic feedback is dispatched by default.
    #[serde(default = "default_haptics")]
    pub haptics: bool,

    /// Focus countdown length used when `focus start` names none.
    #[serde(default = "default_focus_minutes")]
    pub default_focus_minutes: u32,

    /// Tick scheduler period in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Overrides the IPC socket location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,

    /// Overrides the session history location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_pattern: default_pattern(),
            default_target_rounds: default_target_rounds(),
            haptics: default_haptics(),
            default_focus_minutes: default_focus_minutes(),
            tick_interval_ms: default_tick_interval_ms(),
            socket_path: None,
            history_path: None,
        }
    }
}

impl Settings {
    /// Loads settings from the default location, falling back to defaults
    /// when no config file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = app_dir()?.join(CONFIG_FILE_NAME);
        if !path.exists() {
            tracing::debug!("no config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads and validates settings from `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(display.clone(), e.to_string()))?;
        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(display, e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates ranges and the default pattern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !TICK_INTERVAL_RANGE_MS.contains(&self.tick_interval_ms) {
            return Err(ConfigError::TickIntervalOutOfRange(self.tick_interval_ms));
        }
        validate_focus_minutes(self.default_focus_minutes)?;
        self.session_config().validate()
    }

    /// Session configuration built from the defaults in these settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            pattern_id: self.default_pattern.clone(),
            target_rounds: self.default_target_rounds,
            haptics: self.haptics,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Resolved IPC socket path.
    pub fn socket_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.socket_path {
            Some(path) => Ok(path.clone()),
            None => Ok(app_dir()?.join(SOCKET_FILE_NAME)),
        }
    }

    /// Resolved session history path.
    pub fn history_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.history_path {
            Some(path) => Ok(path.clone()),
            None => Ok(app_dir()?.join(HISTORY_FILE_NAME)),
        }
    }
}

/// Returns `~/.breath-coach`.
pub fn app_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(APP_DIR_NAME))
        .ok_or(ConfigError::HomeNotFound)
}

/// Checks a focus countdown length.
pub fn validate_focus_minutes(minutes: u32) -> Result<(), ConfigError> {
    if (MIN_FOCUS_MINUTES..=MAX_FOCUS_MINUTES).contains(&minutes) {
        Ok(())
    } else {
        Err(ConfigError::FocusMinutesOutOfRange(minutes))
    }
}

/// Checks that `pattern_id` names a catalog entry.
pub fn ensure_known_pattern(pattern_id: &str) -> Result<(), ConfigError> {
    patterns::find_pattern(pattern_id)
        .map(|_| ())
        .ok_or_else(|| ConfigError::UnknownPattern(pattern_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_pattern, "4-7-8");
        assert_eq!(settings.default_target_rounds, 4);
        assert!(settings.haptics);
        assert_eq!(settings.default_focus_minutes, 30);
        assert_eq!(settings.tick_interval(), Duration::from_millis(50));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"default_pattern":"box"}"#).unwrap();
        assert_eq!(settings.default_pattern, "box");
        assert_eq!(settings.default_target_rounds, 4);
        assert_eq!(settings.tick_interval_ms, 50);
        assert!(settings.socket_path.is_none());
    }

    #[test]
    fn test_validate_tick_interval() {
        let settings = Settings {
            tick_interval_ms: 5,
            ..Settings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::TickIntervalOutOfRange(5))
        );
    }

    #[test]
    fn test_validate_unknown_default_pattern() {
        let settings = Settings {
            default_pattern: "nope".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::UnknownPattern(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"default_target_rounds":10,"haptics":false,"socket_path":"/tmp/bc.sock"}"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.default_target_rounds, 10);
        assert!(!settings.haptics);
        assert_eq!(settings.socket_path().unwrap(), PathBuf::from("/tmp/bc.sock"));
    }

    #[test]
    fn test_load_from_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            Settings::load_from(&path),
            Err(ConfigError::Parse(_, _))
        ));
    }

    #[test]
    fn test_load_from_out_of_range_rounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"default_target_rounds":0}"#).unwrap();

        assert_eq!(
            Settings::load_from(&path),
            Err(ConfigError::TargetRoundsOutOfRange(0))
        );
    }

    #[test]
    fn test_validate_focus_minutes() {
        assert!(validate_focus_minutes(1).is_ok());
        assert!(validate_focus_minutes(1439).is_ok());
        assert_eq!(
            validate_focus_minutes(0),
            Err(ConfigError::FocusMinutesOutOfRange(0))
        );
        assert!(validate_focus_minutes(1440).is_err());
    }

    #[test]
    fn test_load_from_out_of_range_focus_minutes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"default_focus_minutes":2000}"#).unwrap();

        assert_eq!(
            Settings::load_from(&path),
            Err(ConfigError::FocusMinutesOutOfRange(2000))
        );
    }

    #[test]
    fn test_ensure_known_pattern() {
        assert!(ensure_known_pattern("box").is_ok());
        assert!(ensure_known_pattern("unknown").is_err());
    }
}
