//! Speaking phrases on the user's behalf
//!
//! `SpeechSynthesizer` is the platform seam; `UtterancePresenter` cancels
//! whatever is playing, speaks the new phrase and records it as an
//! assistant turn.

mod presenter;

pub use presenter::UtterancePresenter;

/// Platform speech-synthesis capability
pub trait SpeechSynthesizer: Send {
    /// Start speaking `text`.
    fn speak(&mut self, text: &str) -> anyhow::Result<()>;

    /// Interrupt any utterance in progress.
    fn cancel(&mut self);

    /// Display name for logs.
    fn name(&self) -> String;
}
