//! Utterance presenter

use tracing::{info, warn};

use crate::error::SynthesisError;
use crate::transcript::{LineId, Reconciler};

use super::SpeechSynthesizer;

pub struct UtterancePresenter {
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
}

impl UtterancePresenter {
    /// Wrap a platform synthesizer; `None` when the platform has none
    pub fn new(synthesizer: Option<Box<dyn SpeechSynthesizer>>) -> Self {
        match &synthesizer {
            Some(s) => info!(synthesizer = %s.name(), "speech synthesizer available"),
            None => warn!("no speech synthesizer available"),
        }
        Self { synthesizer }
    }

    pub fn is_supported(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Speak `text`, replacing any utterance in flight.
    ///
    /// The assistant turn is recorded whether or not synthesis worked; the
    /// transcript shows what the user meant to say.
    pub fn speak(
        &mut self,
        text: &str,
        reconciler: &mut Reconciler,
    ) -> (LineId, Result<(), SynthesisError>) {
        let synthesis = match self.synthesizer.as_mut() {
            Some(synthesizer) => {
                synthesizer.cancel();
                synthesizer.speak(text).map_err(|e| {
                    warn!(error = %e, "speech synthesis failed");
                    SynthesisError::Failed(e.to_string())
                })
            }
            None => Err(SynthesisError::Unsupported),
        };

        let line = reconciler.add_assistant_turn(text);
        info!(line, "phrase spoken");
        (line, synthesis)
    }
}
