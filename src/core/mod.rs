//! Core modules for Shakeball

pub mod animation;
pub mod answers;
pub mod api;
pub mod oracle;
pub mod reveal;
pub mod runtime;
pub mod shake;
pub mod source;
pub mod volume;

pub use animation::{AnimationEngine, AnimationFrame, Easing, RevealSequence, TimedAnimationEngine};
pub use answers::{pool, AnswerSelector, BINARY_ANSWERS, MYSTICAL_ANSWERS};
pub use api::{create_router, run_server};
pub use oracle::{Effect, Oracle, OracleEvent};
pub use reveal::{RevealOrchestrator, RevealOutcome, RevealPhase};
pub use runtime::{OracleHandle, OracleRuntime, RuntimeBuilder};
pub use shake::ShakeDetector;
pub use source::{
    MotionSource, Script, ScriptedMotionSource, ScriptedVolumeSource, UnavailableMotionSource,
    VolumeSource,
};
pub use volume::{HoldState, VolumeGestureDetector};
