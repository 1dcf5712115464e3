use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::simulation::DEFAULT_STEP_DELAY;

/// Lab configuration read from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl LabConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.general.log_level {
            if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(ConfigError::InvalidGeneral(format!(
                    "log_level must be one of {}, got '{}'",
                    LOG_LEVELS.join(", "),
                    level
                )));
            }
        }

        if !PING_COUNT_RANGE.contains(&self.simulator.default_ping_count) {
            return Err(ConfigError::InvalidSimulator(format!(
                "default_ping_count must be between {} and {}, got {}",
                PING_COUNT_RANGE.start(),
                PING_COUNT_RANGE.end(),
                self.simulator.default_ping_count
            )));
        }

        Ok(())
    }
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Accepted values for `simulator.default_ping_count`
pub const PING_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

/// General settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Simulator pacing and defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Pause between animation steps, e.g. "400ms"
    #[serde(default = "default_step_delay", with = "humantime_serde")]
    pub step_delay: Duration,
    #[serde(default = "default_ping_count")]
    pub default_ping_count: u32,
}

fn default_step_delay() -> Duration {
    DEFAULT_STEP_DELAY
}

fn default_ping_count() -> u32 {
    4
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            step_delay: default_step_delay(),
            default_ping_count: default_ping_count(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid simulator configuration: {0}")]
    InvalidSimulator(String),
}
