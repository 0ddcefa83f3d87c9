//! Reveal Orchestrator: owns the busy lock
//!
//! State transitions:
//! - IDLE → REVEALING: accepted request (answer picked, lock taken)
//! - REVEALING → IDLE: animation completion (answer committed, lock released)
//! - REVEALING + request: dropped, no queueing
//!
//! The answer is chosen before the lock is taken and only becomes visible
//! inside the completion, together with the lock release.

use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::core::animation::{AnimationFrame, RevealSequence};
use crate::core::answers::AnswerSelector;
use crate::types::{AnswerMode, OracleStatus, ReasonCode, RevealConfig};
use crate::INITIAL_ANSWER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    Idle,
    Revealing {
        cycle: u64,
        pending_answer: &'static str,
        started_at: Instant,
    },
}

/// Mode reset to schedule for a binary reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeReset {
    pub cycle: u64,
    pub due: Instant,
}

impl ModeReset {
    pub fn delay_from(&self, now: Instant) -> Duration {
        self.due.saturating_duration_since(now)
    }
}

/// Accepted request: caller must start the animation for `cycle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealStarted {
    pub cycle: u64,
    pub mode: AnswerMode,
    pub mode_reset: Option<ModeReset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Started(RevealStarted),
    Dropped,
}

impl RevealOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, RevealOutcome::Started(_))
    }
}

#[derive(Debug)]
pub struct RevealOrchestrator {
    config: RevealConfig,
    selector: AnswerSelector,
    sequence: RevealSequence,
    phase: RevealPhase,
    current_answer: String,
    mode: AnswerMode,
    /// Cycle whose mode reset is still outstanding
    binary_cycle: Option<u64>,
    next_cycle: u64,
    reveal_count: u64,
    last_reason: Option<ReasonCode>,
}

impl RevealOrchestrator {
    pub fn new(config: RevealConfig, selector: AnswerSelector) -> Self {
        Self {
            config,
            selector,
            sequence: RevealSequence::standard(),
            phase: RevealPhase::Idle,
            current_answer: INITIAL_ANSWER.to_string(),
            mode: AnswerMode::Normal,
            binary_cycle: None,
            next_cycle: 0,
            reveal_count: 0,
            last_reason: None,
        }
    }

    /// Start a reveal unless one is already in flight
    pub fn request_reveal(&mut self, mode: AnswerMode, now: Instant) -> RevealOutcome {
        if self.is_revealing() {
            debug!(%mode, "reveal in progress, request dropped");
            self.last_reason = Some(ReasonCode::O001_REVEAL_DROPPED);
            return RevealOutcome::Dropped;
        }

        let pending_answer = self.selector.select(mode);
        let cycle = self.next_cycle;
        self.next_cycle += 1;
        self.phase = RevealPhase::Revealing {
            cycle,
            pending_answer,
            started_at: now,
        };

        self.mode = mode;
        let mode_reset = match mode {
            AnswerMode::Binary => {
                self.binary_cycle = Some(cycle);
                Some(ModeReset {
                    cycle,
                    due: now + self.config.binary_display(),
                })
            }
            AnswerMode::Normal => {
                self.binary_cycle = None;
                None
            }
        };

        info!(cycle, %mode, "reveal started");
        self.last_reason = Some(ReasonCode::O001_REVEAL_STARTED);
        RevealOutcome::Started(RevealStarted {
            cycle,
            mode,
            mode_reset,
        })
    }

    /// Animation finished. Returns false for a cycle that is not in flight.
    pub fn on_animation_complete(&mut self, cycle: u64) -> bool {
        match self.phase {
            RevealPhase::Revealing {
                cycle: current,
                pending_answer,
                ..
            } if current == cycle => {
                self.current_answer = pending_answer.to_string();
                self.phase = RevealPhase::Idle;
                self.reveal_count += 1;
                info!(cycle, answer = pending_answer, "answer revealed");
                self.last_reason = Some(ReasonCode::O002_REVEAL_COMMITTED);
                true
            }
            _ => {
                debug!(cycle, "stale animation completion");
                self.last_reason = Some(ReasonCode::O002_STALE_COMPLETION);
                false
            }
        }
    }

    /// Binary display window over for `cycle`
    pub fn on_mode_reset(&mut self, cycle: u64) {
        if self.binary_cycle == Some(cycle) {
            self.mode = AnswerMode::Normal;
            self.binary_cycle = None;
            debug!(cycle, "mode reset to normal");
            self.last_reason = Some(ReasonCode::O003_MODE_RESET);
        } else {
            self.last_reason = Some(ReasonCode::O003_MODE_RESET_SKIPPED);
        }
    }

    /// Animated values at `now`; rest whenever idle
    pub fn frame_at(&self, now: Instant) -> AnimationFrame {
        match self.phase {
            RevealPhase::Revealing { started_at, .. } => {
                self.sequence.frame_at(now.saturating_duration_since(started_at))
            }
            RevealPhase::Idle => AnimationFrame::REST,
        }
    }

    pub fn sequence(&self) -> &RevealSequence {
        &self.sequence
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    /// The busy lock
    pub fn is_revealing(&self) -> bool {
        matches!(self.phase, RevealPhase::Revealing { .. })
    }

    pub fn current_answer(&self) -> &str {
        &self.current_answer
    }

    pub fn mode(&self) -> AnswerMode {
        self.mode
    }

    pub fn reveal_count(&self) -> u64 {
        self.reveal_count
    }

    pub fn last_reason(&self) -> Option<ReasonCode> {
        self.last_reason
    }

    pub fn status(&self) -> OracleStatus {
        OracleStatus::new(
            self.current_answer.clone(),
            self.is_revealing(),
            self.mode,
            self.reveal_count,
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::answers::{BINARY_ANSWERS, MYSTICAL_ANSWERS};

    fn orchestrator() -> RevealOrchestrator {
        RevealOrchestrator::new(RevealConfig::default(), AnswerSelector::seeded(1))
    }

    fn started(outcome: RevealOutcome) -> RevealStarted {
        match outcome {
            RevealOutcome::Started(s) => s,
            RevealOutcome::Dropped => panic!("reveal was dropped"),
        }
    }

    #[test]
    fn test_initial_state() {
        let o = orchestrator();
        assert!(!o.is_revealing());
        assert_eq!(o.current_answer(), INITIAL_ANSWER);
        assert_eq!(o.mode(), AnswerMode::Normal);
    }

    #[test]
    fn test_answer_hidden_until_completion() {
        let t0 = Instant::now();
        let mut o = orchestrator();
        let s = started(o.request_reveal(AnswerMode::Normal, t0));
        assert!(o.is_revealing());
        assert_eq!(o.current_answer(), INITIAL_ANSWER);

        assert!(o.on_animation_complete(s.cycle));
        assert!(!o.is_revealing());
        assert!(MYSTICAL_ANSWERS.contains(&o.current_answer()));
        assert_eq!(o.reveal_count(), 1);
    }

    #[test]
    fn test_second_request_dropped_while_revealing() {
        let t0 = Instant::now();
        let mut o = orchestrator();
        let s = started(o.request_reveal(AnswerMode::Normal, t0));
        let before = o.phase();

        assert_eq!(o.request_reveal(AnswerMode::Normal, t0), RevealOutcome::Dropped);
        assert_eq!(o.request_reveal(AnswerMode::Binary, t0), RevealOutcome::Dropped);
        assert_eq!(o.phase(), before);
        assert_eq!(o.mode(), AnswerMode::Normal);
        assert_eq!(o.current_answer(), INITIAL_ANSWER);

        o.on_animation_complete(s.cycle);
        assert!(o.request_reveal(AnswerMode::Normal, t0).is_started());
    }

    #[test]
    fn test_stale_completion_ignored() {
        let t0 = Instant::now();
        let mut o = orchestrator();
        let s = started(o.request_reveal(AnswerMode::Normal, t0));
        assert!(!o.on_animation_complete(s.cycle + 1));
        assert!(o.is_revealing());
        assert!(o.on_animation_complete(s.cycle));
        assert!(!o.on_animation_complete(s.cycle));
        assert_eq!(o.reveal_count(), 1);
    }

    #[test]
    fn test_binary_sets_mode_and_schedules_reset() {
        let t0 = Instant::now();
        let mut o = orchestrator();
        let s = started(o.request_reveal(AnswerMode::Binary, t0));
        assert_eq!(o.mode(), AnswerMode::Binary);
        let reset = s.mode_reset.expect("reset scheduled");
        assert_eq!(reset.due, t0 + Duration::from_secs(2));

        o.on_animation_complete(s.cycle);
        assert!(BINARY_ANSWERS.contains(&o.current_answer()));
        // mode survives completion, reset is time-based
        assert_eq!(o.mode(), AnswerMode::Binary);

        o.on_mode_reset(reset.cycle);
        assert_eq!(o.mode(), AnswerMode::Normal);
        o.on_mode_reset(reset.cycle);
        assert_eq!(o.mode(), AnswerMode::Normal);
    }

    #[test]
    fn test_old_mode_reset_skips_newer_binary() {
        let t0 = Instant::now();
        let mut o = orchestrator();
        let first = started(o.request_reveal(AnswerMode::Binary, t0));
        o.on_animation_complete(first.cycle);
        let later = t0 + Duration::from_millis(1500);
        let second = started(o.request_reveal(AnswerMode::Binary, later));

        o.on_mode_reset(first.cycle);
        assert_eq!(o.last_reason(), Some(ReasonCode::O003_MODE_RESET_SKIPPED));
        assert_eq!(o.mode(), AnswerMode::Binary);
        o.on_mode_reset(second.cycle);
        assert_eq!(o.mode(), AnswerMode::Normal);
    }

    #[test]
    fn test_normal_reveal_clears_binary_mode() {
        let t0 = Instant::now();
        let mut o = orchestrator();
        let binary = started(o.request_reveal(AnswerMode::Binary, t0));
        o.on_animation_complete(binary.cycle);
        let normal = started(o.request_reveal(AnswerMode::Normal, t0));
        assert_eq!(o.mode(), AnswerMode::Normal);

        // late reset from the binary reveal is a no-op
        o.on_mode_reset(binary.cycle);
        assert_eq!(o.last_reason(), Some(ReasonCode::O003_MODE_RESET_SKIPPED));
        assert_eq!(o.mode(), AnswerMode::Normal);
        assert!(o.on_animation_complete(normal.cycle));
    }

    #[test]
    fn test_normal_reveal_has_no_reset() {
        let mut o = orchestrator();
        let s = started(o.request_reveal(AnswerMode::Normal, Instant::now()));
        assert!(s.mode_reset.is_none());
    }

    #[test]
    fn test_frame_returns_to_rest() {
        let t0 = Instant::now();
        let mut o = orchestrator();
        let s = started(o.request_reveal(AnswerMode::Normal, t0));
        let mid = o.frame_at(t0 + Duration::from_millis(300));
        assert!((mid.scale - 1.2).abs() < 1e-9);
        o.on_animation_complete(s.cycle);
        assert_eq!(o.frame_at(t0 + Duration::from_millis(300)), AnimationFrame::REST);
    }
}
