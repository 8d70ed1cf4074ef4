//! Run configuration
//!
//! The values behind the UI controls. Persisted in LocalStorage on the web so
//! the last used board comes back on reload; loaded from a JSON file natively.

use std::fmt;

use serde::{Deserialize, Serialize};

pub use crate::sim::ball::CollisionPolicy;
use crate::consts::{MAX_ROWS, MAX_SPEED};

/// Errors from loading a configuration
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read
    Io(std::io::Error),
    /// The contents were not a valid configuration
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Peg rows (0 gives a single bin and no pegs)
    pub rows: u32,
    /// Balls dropped per run
    pub balls: u32,
    /// Physics sub-steps per animation frame
    pub speed: u32,
    /// Fixed RNG seed; a fresh seed per run when absent
    pub seed: Option<u64>,
    pub policy: CollisionPolicy,
    /// Bounce balls off the canvas edges
    pub wall_bounce: bool,
    /// Draw the binomial expectation over the result bars
    pub show_expected: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            balls: 200,
            speed: 1,
            seed: None,
            policy: CollisionPolicy::PegContact,
            wall_bounce: true,
            show_expected: false,
        }
    }
}

impl SimConfig {
    /// Clamp values into the ranges the UI allows
    pub fn sanitized(mut self) -> Self {
        if self.speed == 0 || self.speed > MAX_SPEED {
            log::warn!("Speed {} out of range, clamping", self.speed);
            self.speed = self.speed.clamp(1, MAX_SPEED);
        }
        if self.rows > MAX_ROWS {
            log::warn!("{} rows requested, clamping to {}", self.rows, MAX_ROWS);
            self.rows = MAX_ROWS;
        }
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "galton_board_config";

    /// Load the last used configuration from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded config from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored config: {}", e),
                }
            }
        }

        log::info!("Using default config");
        Self::default()
    }

    /// Save the configuration to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::debug!("Config saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

/// Read a count from a text field the way the browser's `parseInt` would:
/// optional surrounding whitespace and sign, then leading digits. Anything
/// unparsable or negative yields `fallback`.
pub fn parse_count(text: &str, fallback: u32) -> u32 {
    let trimmed = text.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: &str = {
        let end = unsigned
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(unsigned.len());
        &unsigned[..end]
    };
    if digits.is_empty() {
        return fallback;
    }
    // Saturate absurdly long inputs
    digits.parse().unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.rows, 10);
        assert_eq!(config.speed, 1);
        assert_eq!(config.policy, CollisionPolicy::PegContact);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_sanitized_clamps() {
        let config = SimConfig {
            rows: 500,
            speed: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.rows, MAX_ROWS);
        assert_eq!(config.speed, 1);

        let config = SimConfig {
            speed: 10_000,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.speed, MAX_SPEED);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json(r#"{ "rows": 4, "policy": "row_kick" }"#).unwrap();
        assert_eq!(config.rows, 4);
        assert_eq!(config.policy, CollisionPolicy::RowKick);
        assert_eq!(config.balls, SimConfig::default().balls);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = SimConfig {
            seed: Some(1234),
            show_expected: true,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(SimConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let err = SimConfig::from_json("{ rows: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("invalid config"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SimConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12", 5), 12);
        assert_eq!(parse_count("  7 rows", 5), 7);
        assert_eq!(parse_count("+3", 5), 3);
        assert_eq!(parse_count("0", 5), 0);
        assert_eq!(parse_count("", 5), 5);
        assert_eq!(parse_count("abc", 5), 5);
        assert_eq!(parse_count("-4", 5), 5);
        assert_eq!(parse_count("99999999999999", 5), u32::MAX);
    }
}
