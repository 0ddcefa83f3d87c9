//! Reveal animation: the fixed tween sequence and the engine boundary
//!
//! Sequence (runs once, cannot be aborted):
//! - scale 1.0 → 1.2 (300ms) → 0.9 (200ms) → 1.0 (300ms), linear
//! - rotate 0° → 720° (1500ms), ease-out-cubic

use std::time::Duration;
use tracing::debug;

/// Animated values at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub scale: f64,
    pub rotation_deg: f64,
}

impl AnimationFrame {
    /// Values outside any reveal
    pub const REST: AnimationFrame = AnimationFrame {
        scale: 1.0,
        rotation_deg: 0.0,
    };
}

impl Default for AnimationFrame {
    fn default() -> Self {
        Self::REST
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseOutCubic,
}

impl Easing {
    /// Map progress `t` in [0, 1]
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatedProperty {
    Scale,
    Rotation,
}

/// One stage of the sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub property: AnimatedProperty,
    pub from: f64,
    pub to: f64,
    pub duration: Duration,
    pub easing: Easing,
}

impl Tween {
    fn value_at(&self, into: Duration) -> f64 {
        let t = into.as_secs_f64() / self.duration.as_secs_f64();
        self.from + (self.to - self.from) * self.easing.apply(t)
    }
}

/// Stages played back to back
#[derive(Debug, Clone, PartialEq)]
pub struct RevealSequence {
    stages: Vec<Tween>,
}

impl Default for RevealSequence {
    fn default() -> Self {
        Self::standard()
    }
}

impl RevealSequence {
    /// The pulse-then-spin reveal
    pub fn standard() -> Self {
        let scale = |from, to, ms| Tween {
            property: AnimatedProperty::Scale,
            from,
            to,
            duration: Duration::from_millis(ms),
            easing: Easing::Linear,
        };
        Self {
            stages: vec![
                scale(1.0, 1.2, 300),
                scale(1.2, 0.9, 200),
                scale(0.9, 1.0, 300),
                Tween {
                    property: AnimatedProperty::Rotation,
                    from: 0.0,
                    to: 720.0,
                    duration: Duration::from_millis(1500),
                    easing: Easing::EaseOutCubic,
                },
            ],
        }
    }

    pub fn stages(&self) -> &[Tween] {
        &self.stages
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Evaluate the sequence `elapsed` after it started
    pub fn frame_at(&self, elapsed: Duration) -> AnimationFrame {
        let mut frame = AnimationFrame::REST;
        let mut offset = Duration::ZERO;

        for stage in &self.stages {
            let value = if elapsed >= offset + stage.duration {
                stage.to
            } else if elapsed >= offset {
                stage.value_at(elapsed - offset)
            } else {
                break;
            };
            match stage.property {
                AnimatedProperty::Scale => frame.scale = value,
                AnimatedProperty::Rotation => frame.rotation_deg = value,
            }
            offset += stage.duration;
        }
        frame
    }
}

/// Called exactly once when playback ends
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// External animation service: plays the sequence, then calls back once
pub trait AnimationEngine: Send {
    fn play(&mut self, sequence: &RevealSequence, on_complete: CompletionCallback);
}

/// Completes after the sequence's total duration on the tokio clock
#[derive(Debug, Default, Clone, Copy)]
pub struct TimedAnimationEngine;

impl AnimationEngine for TimedAnimationEngine {
    fn play(&mut self, sequence: &RevealSequence, on_complete: CompletionCallback) {
        let duration = sequence.total_duration();
        debug!(duration_ms = duration.as_millis() as u64, "animation started");
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            on_complete();
        });
    }
}
