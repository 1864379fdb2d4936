//! Events pushed to subscribed UI clients
//!
//! Covers transcript and recording changes, suggestion updates and status
//! messages. Delivery is best effort: a lagging client skips events and
//! catches up from the next snapshot.

use serde::{Deserialize, Serialize};

use crate::state::RecordingState;
use crate::status::StatusKind;
use crate::suggest::Suggestion;
use crate::transcript::TranscriptLine;

/// Events emitted by the session engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The displayed transcript lines changed
    TranscriptChanged {
        lines: Vec<TranscriptLine>,
    },

    /// Recording moved between Idle, Active and Paused
    RecordingStateChanged {
        from: RecordingState,
        to: RecordingState,
    },

    /// A new suggestion set replaced the displayed one
    SuggestionsUpdated {
        suggestions: Vec<Suggestion>,
    },

    /// Transient status message
    Status {
        message: String,
        kind: StatusKind,
    },

    /// The status message timed out
    StatusCleared,
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::TranscriptChanged { lines } => {
                write!(f, "TRANSCRIPT_CHANGED ({} lines)", lines.len())
            }
            SessionEvent::RecordingStateChanged { from, to } => {
                write!(f, "RECORDING_STATE_CHANGED ({} -> {})", from, to)
            }
            SessionEvent::SuggestionsUpdated { suggestions } => {
                write!(f, "SUGGESTIONS_UPDATED ({})", suggestions.len())
            }
            SessionEvent::Status { message, .. } => write!(f, "STATUS ({})", message),
            SessionEvent::StatusCleared => write!(f, "STATUS_CLEARED"),
        }
    }
}
