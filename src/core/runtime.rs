//! Event loop: one tokio task owns the `Oracle`
//!
//! Sources, timers and the animation engine never touch state directly;
//! they post `OracleEvent`s into a single channel that the loop drains in
//! arrival order. Timers check a liveness flag before posting, so a timer
//! that fires after teardown does nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::animation::{AnimationEngine, TimedAnimationEngine};
use crate::core::answers::AnswerSelector;
use crate::core::oracle::{Effect, Oracle, OracleEvent};
use crate::core::source::{MotionSource, SampleSink, SubscriptionHandle, VolumeSink, VolumeSource};
use crate::types::{AnswerMode, OracleConfig, OracleError, OracleStatus, RawVolumeEvent, Sample};

/// Current time on the tokio clock (virtual when the clock is paused)
pub fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

#[derive(Debug)]
enum LoopMessage {
    Event(OracleEvent),
    Shutdown,
}

/// Cloneable command/observe handle at the presentation boundary
#[derive(Debug, Clone)]
pub struct OracleHandle {
    tx: mpsc::UnboundedSender<LoopMessage>,
    status: watch::Receiver<OracleStatus>,
    updates: broadcast::Sender<OracleStatus>,
}

impl OracleHandle {
    fn send(&self, event: OracleEvent) -> Result<(), OracleError> {
        self.tx
            .send(LoopMessage::Event(event))
            .map_err(|_| OracleError::LoopClosed)
    }

    /// Ask for a reveal; dropped by the loop if one is in flight
    pub fn request_reveal(&self, mode: AnswerMode) -> Result<(), OracleError> {
        self.send(OracleEvent::RevealRequested(mode))
    }

    /// Manual tap
    pub fn tap(&self) -> Result<(), OracleError> {
        self.request_reveal(AnswerMode::Normal)
    }

    /// Inject one accelerometer reading, stamped now
    pub fn push_sample(&self, x: f64, y: f64, z: f64) -> Result<(), OracleError> {
        self.send(OracleEvent::SampleArrived(Sample::new(x, y, z, now())))
    }

    /// Inject one volume change, stamped now
    pub fn push_volume(&self, event: RawVolumeEvent) -> Result<(), OracleError> {
        self.send(OracleEvent::VolumeChanged(event.at(now())))
    }

    /// Latest published status
    pub fn status(&self) -> OracleStatus {
        self.status.borrow().clone()
    }

    /// Stream of status changes
    pub fn subscribe(&self) -> broadcast::Receiver<OracleStatus> {
        self.updates.subscribe()
    }

    /// Resolve once no reveal is in flight
    pub async fn wait_until_idle(&self) -> Result<OracleStatus, OracleError> {
        let mut rx = self.status.clone();
        let status = rx
            .wait_for(|s| !s.is_revealing)
            .await
            .map_err(|_| OracleError::LoopClosed)?;
        Ok(status.clone())
    }

    /// Stop the loop; in-flight timers become no-ops
    pub fn shutdown(&self) {
        let _ = self.tx.send(LoopMessage::Shutdown);
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Spawned event loop plus its handle. Dropping it stops the loop.
#[derive(Debug)]
pub struct OracleRuntime {
    handle: OracleHandle,
    task: Option<JoinHandle<OracleStatus>>,
}

impl OracleRuntime {
    pub fn builder(config: OracleConfig) -> RuntimeBuilder {
        RuntimeBuilder::new(config)
    }

    pub fn handle(&self) -> OracleHandle {
        self.handle.clone()
    }

    /// Stop the loop and wait for teardown; returns the final status
    pub async fn shutdown(mut self) -> OracleStatus {
        self.handle.shutdown();
        let Some(task) = self.task.take() else {
            return self.handle.status();
        };
        match task.await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "event loop task failed");
                self.handle.status()
            }
        }
    }
}

impl Drop for OracleRuntime {
    fn drop(&mut self) {
        // not awaited: teardown runs on the loop task once it sees the message
        if self.task.is_some() {
            self.handle.shutdown();
        }
    }
}

pub struct RuntimeBuilder {
    config: OracleConfig,
    selector: Option<AnswerSelector>,
    motion: Option<Box<dyn MotionSource>>,
    volume: Option<Box<dyn VolumeSource>>,
    engine: Box<dyn AnimationEngine>,
}

impl RuntimeBuilder {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            config,
            selector: None,
            motion: None,
            volume: None,
            engine: Box::new(TimedAnimationEngine),
        }
    }

    pub fn selector(mut self, selector: AnswerSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn motion_source(mut self, source: impl MotionSource + 'static) -> Self {
        self.motion = Some(Box::new(source));
        self
    }

    /// Optional capability: leave unset when the host has no volume hook
    pub fn volume_source(mut self, source: Option<Box<dyn VolumeSource>>) -> Self {
        self.volume = source;
        self
    }

    pub fn animation_engine(mut self, engine: impl AnimationEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// Subscribe sources and start the loop. Must run inside a tokio runtime.
    pub fn spawn(self) -> OracleRuntime {
        let (tx, rx) = mpsc::unbounded_channel();
        let oracle = Oracle::new(self.config.clone(), self.selector.unwrap_or_default());
        let (status_tx, status_rx) = watch::channel(oracle.status());
        let (updates, _) = broadcast::channel(64);
        let alive = Arc::new(AtomicBool::new(true));

        let motion = self.motion.and_then(|mut source| {
            let sink_tx = tx.clone();
            let sink: SampleSink = Arc::new(move |x, y, z| {
                let sample = Sample::new(x, y, z, now());
                let _ = sink_tx.send(LoopMessage::Event(OracleEvent::SampleArrived(sample)));
            });
            match source.subscribe(self.config.shake.sample_interval(), sink) {
                Ok(handle) => {
                    info!(
                        interval_ms = self.config.shake.sample_interval_ms,
                        "motion source subscribed"
                    );
                    Some((source, handle))
                }
                Err(e) => {
                    warn!(error = %e, "shake detection disabled");
                    None
                }
            }
        });

        let volume = match self.volume {
            Some(mut source) => {
                let sink_tx = tx.clone();
                let sink: VolumeSink = Arc::new(move |event: RawVolumeEvent| {
                    let event = OracleEvent::VolumeChanged(event.at(now()));
                    let _ = sink_tx.send(LoopMessage::Event(event));
                });
                match source.subscribe(sink) {
                    Ok(handle) => {
                        info!("volume source subscribed");
                        Some((source, handle))
                    }
                    Err(e) => {
                        warn!(error = %e, "volume gesture disabled");
                        None
                    }
                }
            }
            None => {
                info!("no volume capability, volume gesture disabled");
                None
            }
        };

        let event_loop = EventLoop {
            oracle,
            rx,
            tx: tx.clone(),
            engine: self.engine,
            status_tx,
            updates: updates.clone(),
            alive,
            motion,
            volume,
        };
        let task = tokio::spawn(event_loop.run());

        OracleRuntime {
            handle: OracleHandle {
                tx,
                status: status_rx,
                updates,
            },
            task: Some(task),
        }
    }
}

struct EventLoop {
    oracle: Oracle,
    rx: mpsc::UnboundedReceiver<LoopMessage>,
    tx: mpsc::UnboundedSender<LoopMessage>,
    engine: Box<dyn AnimationEngine>,
    status_tx: watch::Sender<OracleStatus>,
    updates: broadcast::Sender<OracleStatus>,
    alive: Arc<AtomicBool>,
    motion: Option<(Box<dyn MotionSource>, SubscriptionHandle)>,
    volume: Option<(Box<dyn VolumeSource>, SubscriptionHandle)>,
}

impl EventLoop {
    async fn run(mut self) -> OracleStatus {
        debug!("event loop started");
        while let Some(message) = self.rx.recv().await {
            match message {
                LoopMessage::Event(event) => {
                    let effects = self.oracle.handle_logged(event, now());
                    for effect in effects {
                        self.execute(effect);
                    }
                    self.publish();
                }
                LoopMessage::Shutdown => break,
            }
        }
        self.teardown()
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::PlayAnimation { cycle } => {
                let tx = self.tx.clone();
                let alive = Arc::clone(&self.alive);
                self.engine.play(
                    self.oracle.orchestrator().sequence(),
                    Box::new(move || {
                        if alive.load(Ordering::SeqCst) {
                            let done = OracleEvent::AnimationDone { cycle };
                            let _ = tx.send(LoopMessage::Event(done));
                        }
                    }),
                );
            }
            Effect::ScheduleHoldCheck { token, delay } => {
                self.schedule(delay, OracleEvent::HoldCheckDue { token });
            }
            Effect::ScheduleModeReset { cycle, delay } => {
                self.schedule(delay, OracleEvent::ModeResetDue { cycle });
            }
        }
    }

    fn schedule(&self, delay: Duration, event: OracleEvent) {
        let tx = self.tx.clone();
        let alive = Arc::clone(&self.alive);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if alive.load(Ordering::SeqCst) {
                let _ = tx.send(LoopMessage::Event(event));
            }
        });
    }

    fn publish(&mut self) {
        let status = self.oracle.status();
        if self.status_tx.borrow().same_view(&status) {
            return;
        }
        self.status_tx.send_replace(status.clone());
        let _ = self.updates.send(status);
    }

    fn teardown(mut self) -> OracleStatus {
        self.alive.store(false, Ordering::SeqCst);
        if let Some((mut source, handle)) = self.motion.take() {
            source.unsubscribe(handle);
        }
        if let Some((mut source, handle)) = self.volume.take() {
            source.unsubscribe(handle);
        }
        self.oracle.shutdown();
        info!("event loop stopped");
        self.oracle.status()
    }
}
