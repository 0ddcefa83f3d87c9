//! Push-style input sources
//!
//! The motion source is always present but may fail to start. The volume
//! source is an optional capability resolved once at startup: `None`
//! means the host has no volume hook at all.
//!
//! Scripted sources replay a JSON-lines script on the tokio clock:
//!
//! ```text
//! {"kind":"sample","x":0.0,"y":0.0,"z":1.0}
//! {"kind":"volume","at_ms":0,"level":0.3,"direction":"down"}
//! {"kind":"tap","at_ms":2500}
//! ```
//!
//! Samples are pushed in order at the sampling interval; `at_ms` only
//! applies to volume and tap lines.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::types::{RawVolumeEvent, SourceError, VolumeDirection};

/// Token returned by `subscribe`, given back to `unsubscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

/// Receives raw (x, y, z) readings
pub type SampleSink = Arc<dyn Fn(f64, f64, f64) + Send + Sync>;

/// Receives raw volume changes
pub type VolumeSink = Arc<dyn Fn(RawVolumeEvent) + Send + Sync>;

pub trait MotionSource: Send {
    fn subscribe(
        &mut self,
        interval: Duration,
        sink: SampleSink,
    ) -> Result<SubscriptionHandle, SourceError>;
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
}

pub trait VolumeSource: Send {
    fn subscribe(&mut self, sink: VolumeSink) -> Result<SubscriptionHandle, SourceError>;
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
}

/// Playback tasks keyed by handle, aborted on unsubscribe or drop
#[derive(Debug, Default)]
struct Subscriptions {
    next_id: u64,
    tasks: HashMap<u64, JoinHandle<()>>,
}

impl Subscriptions {
    fn insert(&mut self, task: JoinHandle<()>) -> SubscriptionHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.insert(id, task);
        SubscriptionHandle(id)
    }

    fn remove(&mut self, handle: SubscriptionHandle) {
        if let Some(task) = self.tasks.remove(&handle.0) {
            task.abort();
        }
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

// =============================================================================
// MOTION
// =============================================================================

/// Replays recorded readings at the requested interval
#[derive(Debug, Default)]
pub struct ScriptedMotionSource {
    readings: Arc<Vec<[f64; 3]>>,
    subscriptions: Subscriptions,
}

impl ScriptedMotionSource {
    pub fn new(readings: Vec<[f64; 3]>) -> Self {
        Self {
            readings: Arc::new(readings),
            subscriptions: Subscriptions::default(),
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }
}

impl MotionSource for ScriptedMotionSource {
    fn subscribe(
        &mut self,
        interval: Duration,
        sink: SampleSink,
    ) -> Result<SubscriptionHandle, SourceError> {
        if interval.is_zero() {
            return Err(SourceError::Setup {
                source_name: "motion",
                message: "sampling interval must be positive".into(),
            });
        }
        let readings = Arc::clone(&self.readings);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            for [x, y, z] in readings.iter().copied() {
                ticker.tick().await;
                sink(x, y, z);
            }
            debug!(count = readings.len(), "motion script finished");
        });
        Ok(self.subscriptions.insert(task))
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        self.subscriptions.remove(handle);
    }
}

/// Host without an accelerometer
#[derive(Debug, Clone)]
pub struct UnavailableMotionSource {
    reason: String,
}

impl UnavailableMotionSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl MotionSource for UnavailableMotionSource {
    fn subscribe(
        &mut self,
        _interval: Duration,
        _sink: SampleSink,
    ) -> Result<SubscriptionHandle, SourceError> {
        Err(SourceError::Unavailable {
            source_name: "motion",
            reason: self.reason.clone(),
        })
    }

    fn unsubscribe(&mut self, _handle: SubscriptionHandle) {}
}

// =============================================================================
// VOLUME
// =============================================================================

/// Replays volume changes at fixed offsets from subscription
#[derive(Debug, Default)]
pub struct ScriptedVolumeSource {
    events: Arc<Vec<(Duration, RawVolumeEvent)>>,
    subscriptions: Subscriptions,
}

impl ScriptedVolumeSource {
    pub fn new(mut events: Vec<(Duration, RawVolumeEvent)>) -> Self {
        events.sort_by_key(|(at, _)| *at);
        Self {
            events: Arc::new(events),
            subscriptions: Subscriptions::default(),
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }
}

impl VolumeSource for ScriptedVolumeSource {
    fn subscribe(&mut self, sink: VolumeSink) -> Result<SubscriptionHandle, SourceError> {
        let events = Arc::clone(&self.events);
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            for (at, event) in events.iter().copied() {
                tokio::time::sleep_until(start + at).await;
                sink(event);
            }
        });
        Ok(self.subscriptions.insert(task))
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        self.subscriptions.remove(handle);
    }
}

// =============================================================================
// SCRIPT
// =============================================================================

/// One script line, minus its offset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScriptAction {
    Sample {
        x: f64,
        y: f64,
        z: f64,
    },
    Volume {
        level: f64,
        #[serde(default)]
        direction: Option<VolumeDirection>,
    },
    Tap,
}

/// Parsed replay script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub readings: Vec<[f64; 3]>,
    pub volume: Vec<(Duration, RawVolumeEvent)>,
    pub taps: Vec<Duration>,
}

impl Script {
    /// Parse JSON lines; blank lines and `#` comments are skipped
    pub fn parse(text: &str) -> Result<Self, SourceError> {
        let mut script = Script::default();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let script_err = |message: String| SourceError::Script {
                line: index + 1,
                message,
            };

            let value: serde_json::Value =
                serde_json::from_str(line).map_err(|e| script_err(e.to_string()))?;
            let at = Duration::from_millis(
                value.get("at_ms").and_then(serde_json::Value::as_u64).unwrap_or(0),
            );
            let action: ScriptAction =
                serde_json::from_value(value).map_err(|e| script_err(e.to_string()))?;

            match action {
                ScriptAction::Sample { x, y, z } => script.readings.push([x, y, z]),
                ScriptAction::Volume { level, direction } => {
                    script.volume.push((at, RawVolumeEvent::new(level, direction)))
                }
                ScriptAction::Tap => script.taps.push(at),
            }
        }
        Ok(script)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::ReadScript {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn motion_source(&self) -> ScriptedMotionSource {
        ScriptedMotionSource::new(self.readings.clone())
    }

    /// `None` when the script has no volume lines: the capability is absent
    pub fn volume_source(&self) -> Option<ScriptedVolumeSource> {
        if self.volume.is_empty() {
            None
        } else {
            Some(ScriptedVolumeSource::new(self.volume.clone()))
        }
    }

    /// Offset of the last scripted input, saturating at `Duration::MAX`
    pub fn duration(&self, interval: Duration) -> Duration {
        let steps = u32::try_from(self.readings.len().saturating_sub(1)).unwrap_or(u32::MAX);
        let readings = interval.saturating_mul(steps);
        let volume = self.volume.iter().map(|(at, _)| *at).max().unwrap_or_default();
        let taps = self.taps.iter().copied().max().unwrap_or_default();
        readings.max(volume).max(taps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[test]
    fn test_parse_script() {
        let text = r#"
            # warm-up
            {"kind":"sample","x":0.0,"y":0.0,"z":1.0}
            {"kind":"sample","x":0.0,"y":0.0,"z":5.0}
            {"kind":"volume","level":0.5}
            {"kind":"volume","at_ms":20,"level":0.3,"direction":"down"}
            {"kind":"tap","at_ms":2500}
        "#;
        let script = Script::parse(text).unwrap();
        assert_eq!(script.readings, vec![[0.0, 0.0, 1.0], [0.0, 0.0, 5.0]]);
        assert_eq!(
            script.volume,
            vec![
                (Duration::ZERO, RawVolumeEvent::new(0.5, None)),
                (Duration::from_millis(20), RawVolumeEvent::new(0.3, Some(VolumeDirection::Down))),
            ]
        );
        assert_eq!(script.taps, vec![Duration::from_millis(2500)]);
        assert_eq!(script.duration(Duration::from_millis(50)), Duration::from_millis(2500));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let text = "{\"kind\":\"tap\"}\n{\"kind\":\"wiggle\"}";
        match Script::parse(text) {
            Err(SourceError::Script { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected script error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_volume_lines_means_no_capability() {
        let script = Script::parse(r#"{"kind":"sample","x":0,"y":0,"z":1}"#).unwrap();
        assert!(script.volume_source().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_motion_source_pushes_at_interval() {
        let seen: Arc<Mutex<Vec<(f64, tokio::time::Instant)>>> = Arc::default();
        let sink_seen = Arc::clone(&seen);
        let sink: SampleSink = Arc::new(move |_, _, z| {
            sink_seen.lock().unwrap().push((z, tokio::time::Instant::now()));
        });

        let start = tokio::time::Instant::now();
        let readings = vec![[0.0, 0.0, 1.0], [0.0, 0.0, 2.0], [0.0, 0.0, 3.0]];
        let mut source = ScriptedMotionSource::new(readings);
        source.subscribe(Duration::from_millis(50), sink).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        let seen = seen.lock().unwrap();
        let offsets: Vec<u128> = seen.iter().map(|(_, t)| (*t - start).as_millis()).collect();
        assert_eq!(offsets, vec![0, 50, 100]);
        assert_eq!(seen.iter().map(|(z, _)| *z).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_stops_pushes() {
        let count = Arc::new(Mutex::new(0usize));
        let sink_count = Arc::clone(&count);
        let sink: SampleSink = Arc::new(move |_, _, _| *sink_count.lock().unwrap() += 1);

        let mut source = ScriptedMotionSource::new(vec![[0.0, 0.0, 1.0]; 100]);
        let handle = source.subscribe(Duration::from_millis(50), sink).unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        source.unsubscribe(handle);
        assert_eq!(source.active_subscriptions(), 0);
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(*count.lock().unwrap(), 3);
    }

    #[test]
    fn test_unavailable_source_fails() {
        let mut source = UnavailableMotionSource::new("no accelerometer");
        let sink: SampleSink = Arc::new(|_, _, _| {});
        match source.subscribe(Duration::from_millis(50), sink) {
            Err(SourceError::Unavailable { source_name, reason }) => {
                assert_eq!(source_name, "motion");
                assert_eq!(reason, "no accelerometer");
            }
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_interval_is_setup_error() {
        let mut source = ScriptedMotionSource::new(vec![[0.0, 0.0, 1.0]]);
        let sink: SampleSink = Arc::new(|_, _, _| {});
        assert!(matches!(
            source.subscribe(Duration::ZERO, sink),
            Err(SourceError::Setup { .. })
        ));
    }

    #[test]
    fn test_duration_saturates_for_huge_interval() {
        let text = r#"
            {"kind":"sample","x":0,"y":0,"z":1}
            {"kind":"sample","x":0,"y":0,"z":2}
            {"kind":"sample","x":0,"y":0,"z":3}
        "#;
        let script = Script::parse(text).unwrap();
        assert_eq!(script.duration(Duration::MAX), Duration::MAX);
        assert_eq!(
            script.duration(Duration::from_millis(u64::MAX)),
            Duration::from_millis(u64::MAX) * 2
        );
    }
}
