//! Volume-Gesture Detector: press-and-hold on volume-down
//!
//! Two states:
//! - IDLE → HOLDING: decrease event, hold check scheduled
//! - HOLDING → IDLE: increase event (cancel), or the hold check runs
//!
//! Cancellation is logical. The scheduled check is never revoked; when it
//! runs it compares its token against the current hold and bails if the
//! hold it was scheduled for is gone.

use std::time::{Duration, Instant};
use tracing::debug;

use crate::types::{
    AnswerMode, ReasonCode, Trigger, TriggerSource, VolumeConfig, VolumeDirection, VolumeEvent,
};

/// Hold tracking state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldState {
    Idle,
    Holding { since: Instant, token: u64 },
}

/// A deferred check the caller must run at `due`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldCheck {
    pub token: u64,
    pub due: Instant,
}

impl HoldCheck {
    /// Delay from `now` until the check is due
    pub fn delay_from(&self, now: Instant) -> Duration {
        self.due.saturating_duration_since(now)
    }
}

#[derive(Debug)]
pub struct VolumeGestureDetector {
    config: VolumeConfig,
    last_level: Option<f64>,
    hold: HoldState,
    next_token: u64,
    last_reason: Option<ReasonCode>,
}

impl Default for VolumeGestureDetector {
    fn default() -> Self {
        Self::new(VolumeConfig::default())
    }
}

impl VolumeGestureDetector {
    pub fn new(config: VolumeConfig) -> Self {
        Self {
            config,
            last_level: None,
            hold: HoldState::Idle,
            next_token: 0,
            last_reason: None,
        }
    }

    /// Direction of an event. An explicit hint wins over the level heuristic.
    pub fn classify(&self, event: &VolumeEvent) -> Option<VolumeDirection> {
        if let Some(hint) = event.direction_hint {
            return Some(hint);
        }
        let last = self.last_level?;
        if event.level < last - self.config.level_epsilon {
            Some(VolumeDirection::Down)
        } else if event.level > last + self.config.level_epsilon {
            Some(VolumeDirection::Up)
        } else {
            None
        }
    }

    /// Handle a level change. Returns a check to schedule when a hold starts.
    pub fn on_volume_event(&mut self, event: &VolumeEvent) -> Option<HoldCheck> {
        let direction = self.classify(event);
        let mut scheduled = None;

        let reason = match (self.hold, direction) {
            (HoldState::Idle, Some(VolumeDirection::Down)) => {
                let token = self.next_token;
                self.next_token += 1;
                self.hold = HoldState::Holding {
                    since: event.timestamp,
                    token,
                };
                scheduled = Some(HoldCheck {
                    token,
                    due: event.timestamp + self.config.hold_threshold(),
                });
                ReasonCode::V001_HOLD_STARTED
            }
            (HoldState::Holding { .. }, Some(VolumeDirection::Down)) => {
                ReasonCode::V001_HOLD_ALREADY_TRACKED
            }
            (HoldState::Holding { .. }, Some(VolumeDirection::Up)) => {
                self.hold = HoldState::Idle;
                ReasonCode::V002_HOLD_CANCELLED
            }
            (_, _) => ReasonCode::V002_NO_ACTION,
        };

        debug!(level = event.level, ?direction, reason = %reason, "volume event");
        self.last_reason = Some(reason);
        self.last_level = Some(event.level);
        scheduled
    }

    /// Run a previously scheduled check
    pub fn on_hold_check(&mut self, token: u64, now: Instant, busy: bool) -> Option<Trigger> {
        let since = match self.hold {
            HoldState::Holding { since, token: current } if current == token => since,
            _ => {
                self.last_reason = Some(ReasonCode::V003_STALE_CHECK);
                debug!(token, "stale hold check ignored");
                return None;
            }
        };

        self.hold = HoldState::Idle;
        let elapsed = now.saturating_duration_since(since);
        let (trigger, reason) = if elapsed < self.config.hold_threshold() {
            (None, ReasonCode::V003_HOLD_TOO_SHORT)
        } else if busy {
            (None, ReasonCode::V003_HOLD_BUSY)
        } else {
            (
                Some(Trigger::new(TriggerSource::VolumeHold, AnswerMode::Binary, now)),
                ReasonCode::V003_HOLD_FIRED,
            )
        };

        debug!(elapsed_ms = elapsed.as_millis() as u64, reason = %reason, "hold check");
        self.last_reason = Some(reason);
        trigger
    }

    /// Drop any hold in progress; pending checks become stale
    pub fn cancel(&mut self) {
        self.hold = HoldState::Idle;
    }

    pub fn state(&self) -> HoldState {
        self.hold
    }

    pub fn is_holding(&self) -> bool {
        matches!(self.hold, HoldState::Holding { .. })
    }

    pub fn last_level(&self) -> Option<f64> {
        self.last_level
    }

    pub fn last_reason(&self) -> Option<ReasonCode> {
        self.last_reason
    }
}

// =============================================================================
// TESTS
// =============================================================================
