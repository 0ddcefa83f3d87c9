//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while handling a pushed event
#[derive(Debug, Error)]
pub enum OracleError {
    /// The event failed validation; state is left untouched
    #[error("malformed {kind} event: {reason}")]
    MalformedEvent { kind: &'static str, reason: String },

    /// The event loop has shut down
    #[error("event loop is not running")]
    LoopClosed,
}

/// Errors from motion/volume sources
#[derive(Debug, Error)]
pub enum SourceError {
    /// Capability is missing on this host
    #[error("{source_name} source unavailable: {reason}")]
    Unavailable {
        source_name: &'static str,
        reason: String,
    },

    /// Capability exists but failed to start
    #[error("failed to start {source_name} source: {message}")]
    Setup {
        source_name: &'static str,
        message: String,
    },

    /// Bad line in a replay script
    #[error("script line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("failed to read script '{path}': {source}")]
    ReadScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
