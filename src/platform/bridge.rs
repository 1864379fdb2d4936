//! Shell-hosted recognizer and synthesizer

use tracing::debug;

use crate::error::HostUnavailable;
use crate::recognition::SpeechRecognizer;
use crate::speech::SpeechSynthesizer;

use super::{ShellCommand, ShellLink};

/// Recognizer running inside the connected UI shell
pub struct BridgeRecognizer {
    link: ShellLink,
}

impl BridgeRecognizer {
    pub fn new(link: ShellLink) -> Self {
        Self { link }
    }
}

impl SpeechRecognizer for BridgeRecognizer {
    fn start(&mut self) -> anyhow::Result<()> {
        if self.link.send(ShellCommand::RecognizerControl { listening: true }) == 0 {
            return Err(HostUnavailable("recognizer").into());
        }
        Ok(())
    }

    fn stop(&mut self) {
        if self.link.send(ShellCommand::RecognizerControl { listening: false }) == 0 {
            debug!("recognizer stop with no host connected");
        }
    }

    fn name(&self) -> String {
        "shell bridge".to_string()
    }
}

/// Synthesizer running inside the connected UI shell
pub struct BridgeSynthesizer {
    link: ShellLink,
}

impl BridgeSynthesizer {
    pub fn new(link: ShellLink) -> Self {
        Self { link }
    }
}

impl SpeechSynthesizer for BridgeSynthesizer {
    fn speak(&mut self, text: &str) -> anyhow::Result<()> {
        let delivered = self.link.send(ShellCommand::Speak {
            text: text.to_string(),
        });
        if delivered == 0 {
            return Err(HostUnavailable("speech").into());
        }
        Ok(())
    }

    fn cancel(&mut self) {
        self.link.send(ShellCommand::CancelSpeech);
    }

    fn name(&self) -> String {
        "shell bridge".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_without_host_fails() {
        let mut recognizer = BridgeRecognizer::new(ShellLink::new());

        let err = recognizer.start().unwrap_err();
        assert!(err.downcast_ref::<HostUnavailable>().is_some());
    }

    #[test]
    fn test_start_notifies_host() {
        let link = ShellLink::new();
        let mut rx = link.attach();
        let mut recognizer = BridgeRecognizer::new(link);

        recognizer.start().unwrap();
        recognizer.stop();

        assert_eq!(
            rx.try_recv().unwrap(),
            ShellCommand::RecognizerControl { listening: true }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ShellCommand::RecognizerControl { listening: false }
        );
    }

    #[test]
    fn test_speak_notifies_host() {
        let link = ShellLink::new();
        let mut rx = link.attach();
        let mut synthesizer = BridgeSynthesizer::new(link);

        synthesizer.cancel();
        synthesizer.speak("Thank you").unwrap();

        assert_eq!(rx.try_recv().unwrap(), ShellCommand::CancelSpeech);
        assert_eq!(
            rx.try_recv().unwrap(),
            ShellCommand::Speak {
                text: "Thank you".into()
            }
        );
    }

    #[test]
    fn test_speak_after_host_left_fails() {
        let link = ShellLink::new();
        drop(link.attach());
        let mut synthesizer = BridgeSynthesizer::new(link);

        assert!(synthesizer.speak("Thank you").is_err());
    }
}
