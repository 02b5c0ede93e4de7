//! Configuration management for jjtui.
//!
//! Handles persistence and loading of user preferences: pane layout
//! proportions and the default log limit.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Layout configuration
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Default number of revisions shown by log commands
    #[serde(default = "default_log_limit")]
    pub log_limit: u32,
}

fn default_log_limit() -> u32 {
    crate::commands::DEFAULT_LOG_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            log_limit: default_log_limit(),
        }
    }
}

impl Config {
    /// Load configuration from disk, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate();

        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Clamp all values to their valid ranges
    pub fn validate(&mut self) {
        self.layout.validate();
        self.log_limit = self.log_limit.clamp(1, 1000);
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;

        Ok(config_dir.join("jjtui").join("config.json"))
    }
}

/// Layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Height of the split session region as a percentage of the frame (30-85%)
    #[serde(default = "default_split_pct")]
    pub split_pct: u8,

    /// Width/height of the floating session as a percentage of the frame (50-95%)
    #[serde(default = "default_floating_pct")]
    pub floating_pct: u8,
}

fn default_split_pct() -> u8 {
    60
}

fn default_floating_pct() -> u8 {
    80
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            split_pct: default_split_pct(),
            floating_pct: default_floating_pct(),
        }
    }
}

impl LayoutConfig {
    /// Validate and clamp percentages to their valid ranges
    pub fn validate(&mut self) {
        self.split_pct = self.split_pct.clamp(30, 85);
        self.floating_pct = self.floating_pct.clamp(50, 95);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.layout.split_pct, 60);
        assert_eq!(config.layout.floating_pct, 80);
        assert_eq!(config.log_limit, 20);
    }

    #[test]
    fn test_layout_validate() {
        let mut layout = LayoutConfig {
            split_pct: 5,
            floating_pct: 99,
        };
        layout.validate();
        assert_eq!(layout.split_pct, 30);
        assert_eq!(layout.floating_pct, 95);
    }

    #[test]
    fn test_log_limit_clamped() {
        let mut config = Config {
            log_limit: 0,
            ..Config::default()
        };
        config.validate();
        assert_eq!(config.log_limit, 1);

        config.log_limit = 100_000;
        config.validate();
        assert_eq!(config.log_limit, 1000);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            log_limit: 42,
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.log_limit, 42);
        assert_eq!(parsed.layout.split_pct, config.layout.split_pct);
    }
}
