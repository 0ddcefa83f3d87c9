//! Answer mode definitions

use serde::{Deserialize, Serialize};

/// Which answer pool a reveal draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// The 20 classic answers
    #[default]
    Normal,
    /// Plain Yes / No, requested by holding volume-down
    Binary,
}

impl AnswerMode {
    /// Get emoji for mode
    pub fn emoji(&self) -> &'static str {
        match self {
            AnswerMode::Normal => "🎱",
            AnswerMode::Binary => "⚖️",
        }
    }
}

impl std::fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnswerMode::Normal => "NORMAL",
            AnswerMode::Binary => "BINARY",
        };
        write!(f, "{}", name)
    }
}
