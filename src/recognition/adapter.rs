//! Recognition adapter
//!
//! Owns the platform recognizer handle. Start/stop are driven by the recording
//! state machine; the only thing the adapter decides on its own is the
//! transport-level restart after an unsolicited end-of-stream.

use tracing::{debug, info, warn};

use crate::error::{HostUnavailable, RecognitionError};
use crate::state::RecordingState;

use super::{RecognitionEvent, RecognizerCallback, SpeechRecognizer};

pub struct RecognitionAdapter {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    listening: bool,
}

impl RecognitionAdapter {
    /// Wrap a platform recognizer; `None` when the platform has none
    pub fn new(recognizer: Option<Box<dyn SpeechRecognizer>>) -> Self {
        match &recognizer {
            Some(r) => info!(recognizer = %r.name(), "speech recognizer available"),
            None => warn!("no speech recognizer available, recording disabled"),
        }

        Self {
            recognizer,
            listening: false,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Begin capture
    pub(crate) fn start(&mut self) -> Result<(), RecognitionError> {
        let recognizer = self
            .recognizer
            .as_mut()
            .ok_or(RecognitionError::Unsupported)?;

        recognizer.start().map_err(|e| {
            if e.downcast_ref::<HostUnavailable>().is_some() {
                RecognitionError::HostUnavailable
            } else {
                RecognitionError::StartFailed(e.to_string())
            }
        })?;

        self.listening = true;
        debug!("recognizer started");
        Ok(())
    }

    /// End capture
    pub(crate) fn stop(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.stop();
            debug!("recognizer stopped");
        }
        self.listening = false;
    }

    /// Handle an unsolicited end-of-stream.
    ///
    /// Restarts only while the session is `Active`, so a pause that landed
    /// before this callback always wins. Returns whether a restart happened.
    pub(crate) fn on_ended(&mut self, state: RecordingState) -> Result<bool, RecognitionError> {
        self.listening = false;

        if state != RecordingState::Active {
            debug!(%state, "recognizer ended, not restarting");
            return Ok(false);
        }

        let Some(recognizer) = self.recognizer.as_mut() else {
            return Ok(false);
        };

        match recognizer.start() {
            Ok(()) => {
                self.listening = true;
                debug!("recognizer restarted after end-of-stream");
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "could not restart recognizer");
                Err(RecognitionError::RestartFailed(e.to_string()))
            }
        }
    }

    /// Normalize one platform callback into recognition events.
    ///
    /// For a result batch, finals come first in arrival order, followed by a
    /// single interim update holding the concatenated open hypotheses (empty
    /// when there are none). "No speech" errors produce nothing.
    pub fn normalize(callback: RecognizerCallback) -> Vec<RecognitionEvent> {
        match callback {
            RecognizerCallback::Results(results) => {
                let mut events = Vec::with_capacity(results.len() + 1);
                let mut interim = String::new();

                for result in results {
                    if result.is_final {
                        let text = result.text.trim();
                        if !text.is_empty() {
                            events.push(RecognitionEvent::Final(text.to_string()));
                        }
                    } else {
                        interim.push_str(&result.text);
                    }
                }

                events.push(RecognitionEvent::Interim(interim.trim().to_string()));
                events
            }
            RecognizerCallback::Ended => vec![RecognitionEvent::Ended],
            RecognizerCallback::Error(code) => {
                let error = RecognitionError::from_code(&code);
                if error.is_reportable() {
                    vec![RecognitionEvent::Error(error)]
                } else {
                    debug!("no speech detected");
                    Vec::new()
                }
            }
        }
    }
}
