//! Core types for Shakeball

mod config;
mod error;
mod mode;
mod reason;
mod sample;
mod status;
mod trigger;

pub use config::{OracleConfig, RevealConfig, ShakeConfig, VolumeConfig};
pub use error::{ConfigError, OracleError, SourceError};
pub use mode::AnswerMode;
pub use reason::ReasonCode;
pub use sample::{
    validate_level, validate_reading, RawVolumeEvent, Sample, VolumeDirection, VolumeEvent,
};
pub use status::OracleStatus;
pub use trigger::{Trigger, TriggerSource};
