//! Configuration management: the default analysis parameters, persisted
//! to disk so repeated CLI invocations don't need to repeat every flag.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Channel-selection policy for the mono downmix used throughout the
/// sync detector, extractor and analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Left,
    Right,
    Sum,
}

impl Channel {
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "l" => Some(Channel::Left),
            "r" => Some(Channel::Right),
            "s" => Some(Channel::Sum),
            _ => None,
        }
    }
}

/// Amplitude-normalization policy, see [`crate::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizePolicy {
    Global,
    Local,
    Relative,
}

impl NormalizePolicy {
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "g" => Some(NormalizePolicy::Global),
            "l" => Some(NormalizePolicy::Local),
            "r" => Some(NormalizePolicy::Relative),
            _ => None,
        }
    }
}

/// Parameters recognized by the analysis pipeline (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub channel: Channel,
    pub window: crate::window::WindowKind,
    pub normalize: NormalizePolicy,
    pub start_hz: f64,
    pub end_hz: f64,
    pub max_freq: usize,
    pub hz_width: f64,
    pub tolerance_db: f64,
    pub significant_volume_db: f64,
    pub output_filter_function: u8,
    pub spreadsheet: bool,
    pub just_results: bool,
    pub compress_frequencies: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            channel: Channel::Left,
            window: crate::window::WindowKind::Hann,
            normalize: NormalizePolicy::Global,
            start_hz: 10.0,
            end_hz: 20000.0,
            max_freq: 2000,
            hz_width: 20.0,
            tolerance_db: 3.0,
            significant_volume_db: -60.0,
            output_filter_function: 2,
            spreadsheet: false,
            just_results: false,
            compress_frequencies: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Path to the persisted configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "github", "mdf-analyzer")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Loads configuration from disk, or returns defaults if not found.
    #[must_use]
    pub fn load() -> Self {
        Self::try_load().unwrap_or_default()
    }

    pub fn try_load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analysis.max_freq, 2000);
        assert_eq!(config.analysis.tolerance_db, 3.0);
        assert_eq!(config.analysis.channel, Channel::Left);
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.analysis.max_freq, deserialized.analysis.max_freq);
    }
}
