//! Shakeball: magic 8-ball core
//!
//! Noisy input (accelerometer samples, volume-key events, taps) is turned
//! into at most one reveal at a time:
//! sources → detectors → trigger → orchestrator → answer + animation

pub mod core;
pub mod types;

// =============================================================================
// SHAKE DETECTION
// =============================================================================

/// Minimum magnitude delta between consecutive samples to count as "large"
pub const SHAKE_THRESHOLD: f64 = 3.0;

/// Consecutive large deltas required before a shake fires
pub const SHAKE_REQUIRED_DELTAS: u32 = 3;

/// Minimum gap between two shake triggers (milliseconds)
pub const SHAKE_COOLDOWN_MS: u64 = 800;

/// Nominal accelerometer sampling interval (milliseconds)
pub const SAMPLE_INTERVAL_MS: u64 = 50;

/// Log one sample out of this many at trace level
pub const SAMPLE_LOG_EVERY: u64 = 10;

// =============================================================================
// VOLUME GESTURE
// =============================================================================

/// How long the decrease key must be held before a binary reveal (milliseconds)
pub const HOLD_THRESHOLD_MS: u64 = 500;

/// Level change that counts as a direction when no hint is given
pub const VOLUME_LEVEL_EPSILON: f64 = 0.05;

// =============================================================================
// REVEAL
// =============================================================================

/// How long a binary answer keeps the mode flag set (milliseconds)
pub const BINARY_DISPLAY_MS: u64 = 2000;

/// Shown before the first reveal completes
pub const INITIAL_ANSWER: &str = "🎱 Shake!";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
