//! Trigger: a discrete "start a reveal now" signal

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::AnswerMode;

/// Where a trigger came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Shake,
    VolumeHold,
    Tap,
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TriggerSource::Shake => "shake",
            TriggerSource::VolumeHold => "volume-hold",
            TriggerSource::Tap => "tap",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub source: TriggerSource,
    pub mode: AnswerMode,
    pub at: Instant,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.source, self.mode)
    }
}

impl Trigger {
    pub fn new(source: TriggerSource, mode: AnswerMode, at: Instant) -> Self {
        Self { source, mode, at }
    }

    /// Manual request. The tap affordance asks for `Normal`; API callers
    /// may ask for `Binary` directly.
    pub fn tap(mode: AnswerMode, at: Instant) -> Self {
        Self::new(TriggerSource::Tap, mode, at)
    }
}
