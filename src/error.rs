//! Error types for the session engine
//!
//! None of these are fatal to the process. Recognition and logging failures
//! never interrupt the session; suggestion failures become a transient status.

use thiserror::Error;

/// Failures reported by, or on behalf of, the platform speech recognizer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    /// No recognizer is available; recording is disabled for this run
    #[error("speech recognition not supported")]
    Unsupported,

    /// A user-initiated start was refused (e.g. microphone access denied)
    #[error("failed to start speech recognition: {0}")]
    StartFailed(String),

    /// No UI shell is attached to host the recognizer
    #[error("no recognizer host connected")]
    HostUnavailable,

    /// The recognizer heard nothing; never surfaced
    #[error("no speech detected")]
    NoSpeech,

    /// Re-issuing start after an unsolicited end-of-stream failed
    #[error("could not restart recognition: {0}")]
    RestartFailed(String),

    /// Any other recognizer error code
    #[error("recognition error: {0}")]
    Other(String),
}

impl RecognitionError {
    /// Map a platform error code to an error kind
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => RecognitionError::NoSpeech,
            other => RecognitionError::Other(other.to_string()),
        }
    }

    /// Whether this error should be shown to the user
    pub fn is_reportable(&self) -> bool {
        !matches!(self, RecognitionError::NoSpeech)
    }
}

/// A shell-hosted capability was used with no shell attached
#[derive(Debug, Error)]
#[error("no {0} host connected")]
pub struct HostUnavailable(pub &'static str);

/// Failures talking to the remote suggestion service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server returned {status}")]
    Status { status: u16 },

    #[error("invalid response from server: {0}")]
    InvalidResponse(String),
}

/// Failures from the platform speech synthesizer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("speech synthesis not supported")]
    Unsupported,

    #[error("speech synthesis failed: {0}")]
    Failed(String),
}
