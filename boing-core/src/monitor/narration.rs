use chrono::{DateTime, Utc};
use serde::Serialize;

/// Styling hint for a narration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tone {
    Info,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Narration {
    pub at: DateTime<Utc>,
    pub tone: Tone,
    pub message: String,
}

impl Narration {
    pub fn new(tone: Tone, message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            tone,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Narration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}
