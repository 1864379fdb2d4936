//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::SessionEvent;
use crate::phrases::ContextOption;
use crate::platform::ShellCommand;
use crate::recognition::{RecognitionResult, RecognizerCallback};
use crate::session::{Context, ContextKind};
use crate::state::RecordingState;
use crate::status::StatusMessage;
use crate::suggest::{SuggestMode, Suggestion};
use crate::transcript::TranscriptLine;

/// Largest accepted frame body
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Requests from the UI shell to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Request a full session snapshot
    GetStatus,

    /// Subscribe to push notifications
    Subscribe,

    /// Generic phrases and selectable contexts
    ListPhrases,

    SelectContext {
        context: ContextKind,
        #[serde(default)]
        qualifier: Option<String>,
    },

    StartRecording,
    PauseRecording,
    ResumeRecording,
    ToggleRecording,

    RefreshSuggestions {
        #[serde(default)]
        mode: SuggestMode,
    },

    /// Speak and log one of the displayed suggestions
    ChooseSuggestion { id: String },

    /// Speak and log a typed reply
    SubmitReply { text: String },

    /// Speak a generic phrase
    SpeakPhrase { text: String },

    /// Remove every displayed transcript line
    ClearTranscript,

    /// A result batch from the shell's recognizer
    RecognizerResults { results: Vec<RecognitionResult> },

    /// The shell's recognizer stopped on its own
    RecognizerEnded,

    /// The shell's recognizer reported an error code
    RecognizerError { error: String },
}

impl Request {
    /// Split off the recognizer callbacks, which feed the engine's event
    /// stream directly and need no reply from it
    pub fn into_recognizer_callback(self) -> Result<RecognizerCallback, Request> {
        match self {
            Request::RecognizerResults { results } => Ok(RecognizerCallback::Results(results)),
            Request::RecognizerEnded => Ok(RecognizerCallback::Ended),
            Request::RecognizerError { error } => Ok(RecognizerCallback::Error(error)),
            other => Err(other),
        }
    }
}

/// Responses from the daemon to the UI shell
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current session snapshot
    Status(SessionStatus),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Request applied
    Ok,

    /// A suggestion refresh was issued
    Refreshing { request_id: u64 },

    Phrases {
        generic: Vec<String>,
        contexts: Vec<ContextOption>,
    },

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Push notification from daemon to UI (for subscribed clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Session change; may be skipped when the client falls behind
    Event { event: SessionEvent },

    /// Work for the shell's recognizer or synthesizer; never skipped
    Command { command: ShellCommand },
}

/// Full session snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Daemon version
    pub version: String,

    pub session_id: Uuid,

    pub context: Option<Context>,

    pub context_label: Option<String>,

    pub recording: RecordingState,

    pub recognizer_supported: bool,

    pub synthesizer_supported: bool,

    /// Accumulated user transcript
    pub transcript: String,

    /// Lines currently displayed
    pub lines: Vec<TranscriptLine>,

    pub suggestions: Vec<Suggestion>,

    pub status: Option<StatusMessage>,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let req = Request::SelectContext {
            context: ContextKind::Medical,
            qualifier: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("select_context"));
        assert!(json.contains("medical"));
    }

    #[test]
    fn test_recognizer_results_deserialization() {
        let json = r#"{"type":"recognizer_results","results":[{"text":"I need","is_final":false},{"text":"water"}]}"#;
        let req: Request = serde_json::from_str(json).unwrap();
        match req {
            Request::RecognizerResults { results } => {
                assert_eq!(results.len(), 2);
                assert!(!results[1].is_final);
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_refresh_mode_defaults_to_contextual() {
        let req: Request = serde_json::from_str(r#"{"type":"refresh_suggestions"}"#).unwrap();
        assert!(matches!(
            req,
            Request::RefreshSuggestions {
                mode: SuggestMode::Contextual
            }
        ));
    }

    #[test]
    fn test_recognizer_requests_become_callbacks() {
        let req = Request::RecognizerError {
            error: "network".into(),
        };
        assert_eq!(
            req.into_recognizer_callback().unwrap(),
            RecognizerCallback::Error("network".into())
        );
        assert_eq!(
            Request::RecognizerEnded.into_recognizer_callback().unwrap(),
            RecognizerCallback::Ended
        );
        assert!(matches!(
            Request::Ping.into_recognizer_callback(),
            Err(Request::Ping)
        ));
    }

    #[test]
    fn test_notification_nests_command() {
        let note = Notification::Command {
            command: ShellCommand::Speak {
                text: "Thank you".into(),
            },
        };
        let json = serde_json::to_string(&note).unwrap();
        assert_eq!(
            json,
            r#"{"type":"command","command":{"type":"speak","text":"Thank you"}}"#
        );
    }

    #[test]
    fn test_notification_nests_event() {
        let note = Notification::Event {
            event: SessionEvent::StatusCleared,
        };
        let json = serde_json::to_string(&note).unwrap();
        assert_eq!(json, r#"{"type":"event","event":{"type":"status_cleared"}}"#);
    }
}
