//! Platform speech capabilities
//!
//! The recognizer and synthesizer live in the UI shell. The bridge
//! implementations queue start/stop/speak/cancel for it on a `ShellLink`;
//! results come back as IPC requests.

mod bridge;
mod link;

pub use bridge::{BridgeRecognizer, BridgeSynthesizer};
pub use link::{ShellCommand, ShellLink};

use tracing::info;

use crate::config::{Config, PlatformBackend};
use crate::recognition::SpeechRecognizer;
use crate::speech::SpeechSynthesizer;

/// Speech capabilities handed to the engine; `None` means unsupported
pub struct Platform {
    pub recognizer: Option<Box<dyn SpeechRecognizer>>,
    pub synthesizer: Option<Box<dyn SpeechSynthesizer>>,
}

impl Platform {
    /// Build the configured backends
    pub fn from_config(config: &Config, link: &ShellLink) -> Self {
        let platform = Self {
            recognizer: create_recognizer(config.recognizer, link),
            synthesizer: create_synthesizer(config.synthesizer, link),
        };

        info!(
            recognizer = platform.recognizer.as_ref().map(|r| r.name()).as_deref().unwrap_or("none"),
            synthesizer = platform.synthesizer.as_ref().map(|s| s.name()).as_deref().unwrap_or("none"),
            "speech platform ready"
        );
        platform
    }
}

fn create_recognizer(backend: PlatformBackend, link: &ShellLink) -> Option<Box<dyn SpeechRecognizer>> {
    match backend {
        PlatformBackend::Bridge => Some(Box::new(BridgeRecognizer::new(link.clone()))),
        PlatformBackend::None => None,
    }
}

fn create_synthesizer(backend: PlatformBackend, link: &ShellLink) -> Option<Box<dyn SpeechSynthesizer>> {
    match backend {
        PlatformBackend::Bridge => Some(Box::new(BridgeSynthesizer::new(link.clone()))),
        PlatformBackend::None => None,
    }
}
