//! Reason codes for detector and orchestrator decisions
//!
//! Every handled event records one of these so logs and tests can tell
//! *why* a trigger did or did not fire.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // S: Shake detector
    // =========================================================================
    /// First sample, baseline stored
    S001_BASELINE_SET,
    /// Delta at or below threshold, count reset
    S002_DELTA_SMALL,
    /// Large delta counted, not enough yet
    S002_DELTA_ACCUMULATING,
    /// Enough deltas but inside the cooldown window
    S003_COOLDOWN,
    /// Enough deltas but a reveal is in flight
    S003_BUSY,
    /// Shake trigger emitted
    S004_SHAKE_FIRED,

    // =========================================================================
    // V: Volume-gesture detector
    // =========================================================================
    /// Decrease while idle, hold check scheduled
    V001_HOLD_STARTED,
    /// Decrease while already holding
    V001_HOLD_ALREADY_TRACKED,
    /// Increase while holding, hold abandoned
    V002_HOLD_CANCELLED,
    /// No direction could be determined, or increase while idle
    V002_NO_ACTION,
    /// Hold check passed, binary trigger emitted
    V003_HOLD_FIRED,
    /// Hold check ran before the threshold elapsed
    V003_HOLD_TOO_SHORT,
    /// Hold check ran while a reveal was in flight
    V003_HOLD_BUSY,
    /// Hold check belongs to an abandoned hold
    V003_STALE_CHECK,

    // =========================================================================
    // O: Reveal orchestrator
    // =========================================================================
    /// Busy lock taken, animation started
    O001_REVEAL_STARTED,
    /// Busy lock held, request dropped
    O001_REVEAL_DROPPED,
    /// Animation done, answer committed, lock released
    O002_REVEAL_COMMITTED,
    /// Completion for a cycle that is not in flight
    O002_STALE_COMPLETION,
    /// Binary display window over, mode back to normal
    O003_MODE_RESET,
    /// Mode reset superseded by a later reveal
    O003_MODE_RESET_SKIPPED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::S001_BASELINE_SET => "S001_BASELINE_SET",
            Self::S002_DELTA_SMALL => "S002_DELTA_SMALL",
            Self::S002_DELTA_ACCUMULATING => "S002_DELTA_ACCUMULATING",
            Self::S003_COOLDOWN => "S003_COOLDOWN",
            Self::S003_BUSY => "S003_BUSY",
            Self::S004_SHAKE_FIRED => "S004_SHAKE_FIRED",
            Self::V001_HOLD_STARTED => "V001_HOLD_STARTED",
            Self::V001_HOLD_ALREADY_TRACKED => "V001_HOLD_ALREADY_TRACKED",
            Self::V002_HOLD_CANCELLED => "V002_HOLD_CANCELLED",
            Self::V002_NO_ACTION => "V002_NO_ACTION",
            Self::V003_HOLD_FIRED => "V003_HOLD_FIRED",
            Self::V003_HOLD_TOO_SHORT => "V003_HOLD_TOO_SHORT",
            Self::V003_HOLD_BUSY => "V003_HOLD_BUSY",
            Self::V003_STALE_CHECK => "V003_STALE_CHECK",
            Self::O001_REVEAL_STARTED => "O001_REVEAL_STARTED",
            Self::O001_REVEAL_DROPPED => "O001_REVEAL_DROPPED",
            Self::O002_REVEAL_COMMITTED => "O002_REVEAL_COMMITTED",
            Self::O002_STALE_COMPLETION => "O002_STALE_COMPLETION",
            Self::O003_MODE_RESET => "O003_MODE_RESET",
            Self::O003_MODE_RESET_SKIPPED => "O003_MODE_RESET_SKIPPED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::S001_BASELINE_SET => "Baseline magnitude stored",
            Self::S002_DELTA_SMALL => "Delta below threshold",
            Self::S002_DELTA_ACCUMULATING => "Large delta counted",
            Self::S003_COOLDOWN => "Shake inside cooldown",
            Self::S003_BUSY => "Shake while revealing",
            Self::S004_SHAKE_FIRED => "Shake detected",
            Self::V001_HOLD_STARTED => "Volume-down hold started",
            Self::V001_HOLD_ALREADY_TRACKED => "Hold already tracked",
            Self::V002_HOLD_CANCELLED => "Hold released early",
            Self::V002_NO_ACTION => "No volume gesture",
            Self::V003_HOLD_FIRED => "Long hold detected",
            Self::V003_HOLD_TOO_SHORT => "Hold shorter than threshold",
            Self::V003_HOLD_BUSY => "Hold while revealing",
            Self::V003_STALE_CHECK => "Stale hold check",
            Self::O001_REVEAL_STARTED => "Reveal started",
            Self::O001_REVEAL_DROPPED => "Reveal already in progress",
            Self::O002_REVEAL_COMMITTED => "Answer revealed",
            Self::O002_STALE_COMPLETION => "Stale animation completion",
            Self::O003_MODE_RESET => "Mode reset to normal",
            Self::O003_MODE_RESET_SKIPPED => "Mode reset superseded",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
