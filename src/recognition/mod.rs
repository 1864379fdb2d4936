//! Speech recognition
//!
//! Wraps a platform continuous-recognition capability behind `SpeechRecognizer`
//! and normalizes its callbacks into one ordered stream of `RecognitionEvent`s.

mod adapter;

pub use adapter::RecognitionAdapter;

use serde::{Deserialize, Serialize};

use crate::error::RecognitionError;

/// Platform continuous speech-to-text capability.
///
/// Results, end-of-stream and errors are not returned from these calls; the
/// platform delivers them later as `RecognizerCallback`s on the engine channel.
pub trait SpeechRecognizer: Send {
    /// Begin continuous capture.
    fn start(&mut self) -> anyhow::Result<()>;

    /// End capture.
    fn stop(&mut self);

    /// Display name for logs.
    fn name(&self) -> String;
}

/// One hypothesis from a recognizer result batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub text: String,
    #[serde(default)]
    pub is_final: bool,
}

#[cfg(test)]
impl RecognitionResult {
    pub fn interim(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_final: false }
    }

    pub fn finalized(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_final: true }
    }
}

/// Raw callbacks as delivered by the platform recognizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerCallback {
    /// A batch of results, starting at the first changed result
    Results(Vec<RecognitionResult>),
    /// The recognizer stopped on its own
    Ended,
    /// The recognizer reported an error code
    Error(String),
}

/// Normalized recognition signal consumed by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Everything not yet final in the latest batch, concatenated
    Interim(String),
    /// One finalized result
    Final(String),
    /// Unsolicited end-of-stream
    Ended,
    /// A reportable recognizer failure
    Error(RecognitionError),
}
