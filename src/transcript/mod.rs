//! Live transcript display
//!
//! Holds the lines currently visible to the user:
//! - at most one interim line (what is being said right now)
//! - finalized lines, each removed after a fixed display lifetime

mod reconciler;

pub use reconciler::{Reconciled, Reconciler};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a displayed transcript line
pub type LineId = u64;

/// Who produced a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The conversation partner, as heard by the recognizer
    User,
    /// A phrase spoken on the user's behalf
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Interim,
    Final,
}

/// A single line of the on-screen transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub id: LineId,
    pub speaker: Speaker,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub status: LineStatus,
}

impl TranscriptLine {
    pub fn is_interim(&self) -> bool {
        self.status == LineStatus::Interim
    }
}
