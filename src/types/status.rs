//! Observable status at the presentation boundary

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::types::AnswerMode;

/// What a presentation layer needs to draw the ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleStatus {
    /// When this status was produced
    pub timestamp: DateTime<Utc>,
    /// Answer currently shown in the window
    pub current_answer: String,
    /// Busy lock: a reveal animation is in flight
    pub is_revealing: bool,
    /// Pool selected by the last accepted trigger
    pub mode: AnswerMode,
    /// Completed reveals since startup
    pub reveal_count: u64,
}

impl OracleStatus {
    pub fn new(
        current_answer: impl Into<String>,
        is_revealing: bool,
        mode: AnswerMode,
        reveal_count: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            current_answer: current_answer.into(),
            is_revealing,
            mode,
            reveal_count,
        }
    }

    /// Same visible state, ignoring the timestamp
    pub fn same_view(&self, other: &OracleStatus) -> bool {
        self.current_answer == other.current_answer
            && self.is_revealing == other.is_revealing
            && self.mode == other.mode
            && self.reveal_count == other.reveal_count
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        if self.is_revealing {
            format!("{} 🌟 The spirits speak... [{}]", self.mode.emoji(), self.mode)
                .magenta()
                .to_string()
        } else {
            format!(
                "{} {} {}",
                self.mode.emoji(),
                self.current_answer.bright_green().italic(),
                format!("[{} | #{}]", self.mode, self.reveal_count).bright_black()
            )
        }
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "answer={} | revealing={} | mode={} | reveals={}",
            self.current_answer, self.is_revealing, self.mode, self.reveal_count
        )
    }
}
