//! Oracle: detectors + orchestrator behind one typed event interface
//!
//! Synchronous and clock-free: the caller passes `now` and executes the
//! returned effects (start animation, arm timers). The event loop in
//! `runtime` is the only production caller.

use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::core::answers::AnswerSelector;
use crate::core::reveal::{RevealOrchestrator, RevealOutcome};
use crate::core::shake::ShakeDetector;
use crate::core::volume::VolumeGestureDetector;
use crate::types::{
    AnswerMode, OracleConfig, OracleError, OracleStatus, Sample, Trigger, VolumeEvent,
};

/// Messages processed strictly in arrival order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OracleEvent {
    SampleArrived(Sample),
    VolumeChanged(VolumeEvent),
    /// Manual request; taps are `Normal`
    RevealRequested(AnswerMode),
    HoldCheckDue { token: u64 },
    AnimationDone { cycle: u64 },
    ModeResetDue { cycle: u64 },
}

/// Work the caller must carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    PlayAnimation { cycle: u64 },
    ScheduleHoldCheck { token: u64, delay: Duration },
    ScheduleModeReset { cycle: u64, delay: Duration },
}

#[derive(Debug)]
pub struct Oracle {
    shake: ShakeDetector,
    volume: VolumeGestureDetector,
    reveal: RevealOrchestrator,
    alive: bool,
}

impl Oracle {
    pub fn new(config: OracleConfig, selector: AnswerSelector) -> Self {
        Self {
            shake: ShakeDetector::new(config.shake),
            volume: VolumeGestureDetector::new(config.volume),
            reveal: RevealOrchestrator::new(config.reveal, selector),
            alive: true,
        }
    }

    /// Handle one event. A malformed event is rejected before any state
    /// is touched; after `shutdown` every event is a no-op.
    pub fn handle(&mut self, event: OracleEvent, now: Instant) -> Result<Vec<Effect>, OracleError> {
        if !self.alive {
            return Ok(Vec::new());
        }

        let busy = self.reveal.is_revealing();
        let effects = match event {
            OracleEvent::SampleArrived(sample) => {
                sample.validate()?;
                match self.shake.on_sample(&sample, busy) {
                    Some(trigger) => self.fire(trigger, now),
                    None => Vec::new(),
                }
            }
            OracleEvent::VolumeChanged(volume_event) => {
                volume_event.validate()?;
                self.volume
                    .on_volume_event(&volume_event)
                    .map(|check| Effect::ScheduleHoldCheck {
                        token: check.token,
                        delay: check.delay_from(now),
                    })
                    .into_iter()
                    .collect()
            }
            OracleEvent::RevealRequested(mode) => self.fire(Trigger::tap(mode, now), now),
            OracleEvent::HoldCheckDue { token } => {
                match self.volume.on_hold_check(token, now, busy) {
                    Some(trigger) => self.fire(trigger, now),
                    None => Vec::new(),
                }
            }
            OracleEvent::AnimationDone { cycle } => {
                self.reveal.on_animation_complete(cycle);
                Vec::new()
            }
            OracleEvent::ModeResetDue { cycle } => {
                self.reveal.on_mode_reset(cycle);
                Vec::new()
            }
        };
        Ok(effects)
    }

    /// Same as `handle`, but failures are logged and swallowed
    pub fn handle_logged(&mut self, event: OracleEvent, now: Instant) -> Vec<Effect> {
        match self.handle(event, now) {
            Ok(effects) => effects,
            Err(e) => {
                warn!(error = %e, "event dropped");
                Vec::new()
            }
        }
    }

    fn fire(&mut self, trigger: Trigger, now: Instant) -> Vec<Effect> {
        match self.reveal.request_reveal(trigger.mode, now) {
            RevealOutcome::Started(started) => {
                info!(%trigger, cycle = started.cycle, "trigger accepted");
                let mut effects = vec![Effect::PlayAnimation { cycle: started.cycle }];
                if let Some(reset) = started.mode_reset {
                    effects.push(Effect::ScheduleModeReset {
                        cycle: reset.cycle,
                        delay: reset.delay_from(now),
                    });
                }
                effects
            }
            RevealOutcome::Dropped => Vec::new(),
        }
    }

    /// Stop reacting; pending timers that fire later are no-ops
    pub fn shutdown(&mut self) {
        self.alive = false;
        self.volume.cancel();
    }

    pub fn status(&self) -> OracleStatus {
        self.reveal.status()
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.is_revealing()
    }

    pub fn shake_detector(&self) -> &ShakeDetector {
        &self.shake
    }

    pub fn volume_detector(&self) -> &VolumeGestureDetector {
        &self.volume
    }

    pub fn orchestrator(&self) -> &RevealOrchestrator {
        &self.reveal
    }
}

// =============================================================================
// TESTS
// =============================================================================
