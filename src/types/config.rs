//! Tunable thresholds, defaulting to the crate constants

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::ConfigError;
use crate::{
    BINARY_DISPLAY_MS, HOLD_THRESHOLD_MS, SAMPLE_INTERVAL_MS, SHAKE_COOLDOWN_MS,
    SHAKE_REQUIRED_DELTAS, SHAKE_THRESHOLD, VOLUME_LEVEL_EPSILON,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeConfig {
    /// Magnitude delta that counts as large (strictly greater)
    pub threshold: f64,
    pub required_deltas: u32,
    pub cooldown_ms: u64,
    pub sample_interval_ms: u64,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            threshold: SHAKE_THRESHOLD,
            required_deltas: SHAKE_REQUIRED_DELTAS,
            cooldown_ms: SHAKE_COOLDOWN_MS,
            sample_interval_ms: SAMPLE_INTERVAL_MS,
        }
    }
}

impl ShakeConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    pub hold_ms: u64,
    /// Level change inferred as a direction when no hint is given
    pub level_epsilon: f64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            hold_ms: HOLD_THRESHOLD_MS,
            level_epsilon: VOLUME_LEVEL_EPSILON,
        }
    }
}

impl VolumeConfig {
    pub fn hold_threshold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub binary_display_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            binary_display_ms: BINARY_DISPLAY_MS,
        }
    }
}

impl RevealConfig {
    pub fn binary_display(&self) -> Duration {
        Duration::from_millis(self.binary_display_ms)
    }
}

/// Full configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub shake: ShakeConfig,
    pub volume: VolumeConfig,
    pub reveal: RevealConfig,
}

impl OracleConfig {
    /// Parse from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: OracleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.shake.threshold.is_finite() || self.shake.threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "shake.threshold must be a non-negative number, got {}",
                self.shake.threshold
            )));
        }
        if self.shake.required_deltas == 0 {
            return Err(ConfigError::Invalid("shake.required_deltas must be at least 1".into()));
        }
        if self.shake.sample_interval_ms == 0 {
            return Err(ConfigError::Invalid("shake.sample_interval_ms must be positive".into()));
        }
        if self.volume.hold_ms == 0 {
            return Err(ConfigError::Invalid("volume.hold_ms must be positive".into()));
        }
        if !self.volume.level_epsilon.is_finite() || self.volume.level_epsilon < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "volume.level_epsilon must be a non-negative number, got {}",
                self.volume.level_epsilon
            )));
        }
        Ok(())
    }
}
