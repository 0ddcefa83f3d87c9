//! Shake Detector: consecutive magnitude-delta debounce
//!
//! Per sample:
//! - no baseline → store magnitude, nothing fires
//! - |Δmagnitude| > threshold → count++, else count = 0
//! - count ≥ required AND cooldown elapsed AND not busy → fire, count = 0
//! - baseline always updated last

use std::time::Instant;
use tracing::{debug, trace};

use crate::types::{AnswerMode, ReasonCode, Sample, ShakeConfig, Trigger, TriggerSource};
use crate::SAMPLE_LOG_EVERY;

#[derive(Debug)]
pub struct ShakeDetector {
    config: ShakeConfig,
    /// Magnitude of the previous sample
    last_magnitude: Option<f64>,
    /// Run length of deltas above threshold
    consecutive_large_deltas: u32,
    /// When the last shake fired
    last_trigger: Option<Instant>,
    /// Samples seen
    sample_count: u64,
    last_reason: Option<ReasonCode>,
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::new(ShakeConfig::default())
    }
}

impl ShakeDetector {
    pub fn new(config: ShakeConfig) -> Self {
        Self {
            config,
            last_magnitude: None,
            consecutive_large_deltas: 0,
            last_trigger: None,
            sample_count: 0,
            last_reason: None,
        }
    }

    /// Feed one sample. `busy` is the reveal lock as seen right now.
    pub fn on_sample(&mut self, sample: &Sample, busy: bool) -> Option<Trigger> {
        let magnitude = sample.magnitude();
        let now = sample.timestamp;
        self.sample_count += 1;

        if self.sample_count % SAMPLE_LOG_EVERY == 0 {
            trace!(
                magnitude,
                x = sample.x,
                y = sample.y,
                z = sample.z,
                "accel"
            );
        }

        let Some(last) = self.last_magnitude else {
            self.last_magnitude = Some(magnitude);
            self.last_reason = Some(ReasonCode::S001_BASELINE_SET);
            return None;
        };

        let delta = (magnitude - last).abs();
        if delta > self.config.threshold {
            self.consecutive_large_deltas += 1;
        } else {
            self.consecutive_large_deltas = 0;
        }

        let (trigger, reason) = self.decide(now, busy);
        if trigger.is_some() {
            debug!(delta, "shake detected");
            self.last_trigger = Some(now);
            self.consecutive_large_deltas = 0;
        } else if reason != ReasonCode::S002_DELTA_SMALL {
            debug!(
                delta,
                count = self.consecutive_large_deltas,
                reason = %reason,
                "shake held back"
            );
        }

        self.last_reason = Some(reason);
        self.last_magnitude = Some(magnitude);
        trigger
    }

    fn decide(&self, now: Instant, busy: bool) -> (Option<Trigger>, ReasonCode) {
        if self.consecutive_large_deltas == 0 {
            return (None, ReasonCode::S002_DELTA_SMALL);
        }
        if self.consecutive_large_deltas < self.config.required_deltas {
            return (None, ReasonCode::S002_DELTA_ACCUMULATING);
        }
        let cooled_down = self
            .last_trigger
            .map(|t| now.saturating_duration_since(t) > self.config.cooldown())
            .unwrap_or(true);
        if !cooled_down {
            return (None, ReasonCode::S003_COOLDOWN);
        }
        if busy {
            return (None, ReasonCode::S003_BUSY);
        }
        (
            Some(Trigger::new(TriggerSource::Shake, AnswerMode::Normal, now)),
            ReasonCode::S004_SHAKE_FIRED,
        )
    }

    /// Current run length of large deltas
    pub fn consecutive_large_deltas(&self) -> u32 {
        self.consecutive_large_deltas
    }

    pub fn last_magnitude(&self) -> Option<f64> {
        self.last_magnitude
    }

    pub fn last_trigger(&self) -> Option<Instant> {
        self.last_trigger
    }

    /// Why the last sample did or did not fire
    pub fn last_reason(&self) -> Option<ReasonCode> {
        self.last_reason
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Sample along z with the given magnitude at `ms` after `t0`
    fn at(t0: Instant, ms: u64, magnitude: f64) -> Sample {
        Sample::new(0.0, 0.0, magnitude, t0 + Duration::from_millis(ms))
    }

    /// Magnitudes alternating 1 / 5 give deltas of 4
    fn burst(
        det: &mut ShakeDetector,
        t0: Instant,
        start_ms: u64,
        n: usize,
        busy: bool,
    ) -> Vec<Option<Trigger>> {
        (0..n)
            .map(|i| {
                let mag = if i % 2 == 0 { 1.0 } else { 5.0 };
                det.on_sample(&at(t0, start_ms + 50 * i as u64, mag), busy)
            })
            .collect()
    }

    #[test]
    fn test_first_sample_sets_baseline() {
        let t0 = Instant::now();
        let mut det = ShakeDetector::default();
        assert!(det.on_sample(&at(t0, 0, 40.0), false).is_none());
        assert_eq!(det.last_magnitude(), Some(40.0));
        assert_eq!(det.last_reason(), Some(ReasonCode::S001_BASELINE_SET));
        assert_eq!(det.consecutive_large_deltas(), 0);
    }

    #[test]
    fn test_three_large_deltas_fire_once() {
        let t0 = Instant::now();
        let mut det = ShakeDetector::default();
        let out = burst(&mut det, t0, 0, 4, false);
        assert!(out[..3].iter().all(|t| t.is_none()));
        let trigger = out[3].expect("third large delta fires");
        assert_eq!(trigger.source, TriggerSource::Shake);
        assert_eq!(trigger.mode, AnswerMode::Normal);
        assert_eq!(trigger.at, t0 + Duration::from_millis(150));
        assert_eq!(det.consecutive_large_deltas(), 0);
    }

    #[test]
    fn test_fourth_delta_does_not_refire() {
        let t0 = Instant::now();
        let mut det = ShakeDetector::default();
        let out = burst(&mut det, t0, 0, 5, false);
        assert!(out[3].is_some());
        assert!(out[4].is_none());
        assert_eq!(det.consecutive_large_deltas(), 1);
    }

    #[test]
    fn test_small_delta_breaks_run() {
        let t0 = Instant::now();
        let mut det = ShakeDetector::default();
        let mags = [1.0, 5.0, 1.0, 1.5, 5.5, 1.5];
        for (i, m) in mags.iter().enumerate() {
            assert!(det.on_sample(&at(t0, 50 * i as u64, *m), false).is_none());
        }
        assert_eq!(det.consecutive_large_deltas(), 2);
    }

    #[test]
    fn test_threshold_is_strict() {
        let t0 = Instant::now();
        let mut det = ShakeDetector::default();
        let mags = [1.0, 4.0, 1.0, 4.0];
        for (i, m) in mags.iter().enumerate() {
            assert!(det.on_sample(&at(t0, 50 * i as u64, *m), false).is_none());
        }
        assert_eq!(det.consecutive_large_deltas(), 0);
    }

    #[test]
    fn test_cooldown_blocks_second_shake() {
        let t0 = Instant::now();
        let mut det = ShakeDetector::default();
        // fires at 150ms, then 3 more large deltas by 300ms
        let out = burst(&mut det, t0, 0, 7, false);
        assert!(out[3].is_some());
        assert!(out[6].is_none());
        assert_eq!(det.last_reason(), Some(ReasonCode::S003_COOLDOWN));
        assert_eq!(det.last_trigger(), Some(t0 + Duration::from_millis(150)));
    }

    #[test]
    fn test_shake_after_cooldown_fires() {
        let t0 = Instant::now();
        let mut det = ShakeDetector::default();
        assert!(burst(&mut det, t0, 0, 4, false)[3].is_some());
        // settle, then a fresh burst starting well past 150 + 800
        det.on_sample(&at(t0, 900, 1.0), false);
        let out = burst(&mut det, t0, 1000, 4, false);
        let second = out.iter().flatten().next().expect("second shake");
        assert!(second.at - t0 > Duration::from_millis(950));
    }

    #[test]
    fn test_cooldown_boundary_is_exclusive() {
        let t0 = Instant::now();
        let mut det = ShakeDetector::default();
        assert!(burst(&mut det, t0, 0, 4, false)[3].is_some());
        // count reaches 3 again exactly 800ms after the 150ms trigger
        let mags = [1.0, 5.0, 1.0];
        let times = [850, 900, 950];
        for (m, t) in mags.iter().zip(times) {
            assert!(det.on_sample(&at(t0, t, *m), false).is_none());
        }
        assert_eq!(det.consecutive_large_deltas(), 3);
        assert_eq!(det.last_reason(), Some(ReasonCode::S003_COOLDOWN));
        // one tick later the run continues and clears the cooldown
        assert!(det.on_sample(&at(t0, 1000, 5.0), false).is_some());
    }

    #[test]
    fn test_busy_suppresses_and_keeps_count() {
        let t0 = Instant::now();
        let mut det = ShakeDetector::default();
        let out = burst(&mut det, t0, 0, 4, true);
        assert!(out.iter().all(|t| t.is_none()));
        assert_eq!(det.last_reason(), Some(ReasonCode::S003_BUSY));
        assert_eq!(det.consecutive_large_deltas(), 3);
        assert!(det.last_trigger().is_none());

        // lock released mid-shake: next large delta fires
        assert!(det.on_sample(&at(t0, 200, 1.0), false).is_some());
    }
}
