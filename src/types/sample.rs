//! Input events pushed by the motion and volume sources

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::OracleError;

/// One accelerometer reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// When the reading arrived
    pub timestamp: Instant,
}

impl Sample {
    /// Create a new sample
    pub fn new(x: f64, y: f64, z: f64, timestamp: Instant) -> Self {
        Self { x, y, z, timestamp }
    }

    /// Euclidean norm of the acceleration vector
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Reject readings a detector must never see
    pub fn validate(&self) -> Result<(), OracleError> {
        validate_reading(self.x, self.y, self.z)
    }
}

/// Check raw axis values before they become a [`Sample`]
pub fn validate_reading(x: f64, y: f64, z: f64) -> Result<(), OracleError> {
    if x.is_finite() && y.is_finite() && z.is_finite() {
        Ok(())
    } else {
        Err(OracleError::MalformedEvent {
            kind: "sample",
            reason: format!("non-finite axis value (x={}, y={}, z={})", x, y, z),
        })
    }
}

/// Direction reported (or inferred) for a volume key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeDirection {
    Down,
    Up,
}

/// A volume level change as delivered by the platform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawVolumeEvent {
    /// Level in 0.0..=1.0
    pub level: f64,
    /// Some platforms report the key that caused the change
    #[serde(default, rename = "direction", skip_serializing_if = "Option::is_none")]
    pub direction_hint: Option<VolumeDirection>,
}

impl RawVolumeEvent {
    pub fn new(level: f64, direction_hint: Option<VolumeDirection>) -> Self {
        Self { level, direction_hint }
    }

    /// Stamp with arrival time
    pub fn at(self, timestamp: Instant) -> VolumeEvent {
        VolumeEvent {
            level: self.level,
            direction_hint: self.direction_hint,
            timestamp,
        }
    }
}

/// Volume event with its arrival time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeEvent {
    pub level: f64,
    pub direction_hint: Option<VolumeDirection>,
    pub timestamp: Instant,
}

impl VolumeEvent {
    pub fn validate(&self) -> Result<(), OracleError> {
        validate_level(self.level)
    }
}

/// Levels outside 0..=1 are malformed
pub fn validate_level(level: f64) -> Result<(), OracleError> {
    if level.is_finite() && (0.0..=1.0).contains(&level) {
        Ok(())
    } else {
        Err(OracleError::MalformedEvent {
            kind: "volume",
            reason: format!("level {} outside 0..=1", level),
        })
    }
}
