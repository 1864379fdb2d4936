//! Command queues to subscribed UI shells
//!
//! Every subscribed shell gets its own unbounded queue, so a command is
//! never overwritten by the transcript and status traffic that shares the
//! connection.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Requests aimed at the recognizer and synthesizer hosted by the shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShellCommand {
    /// Start or stop the shell's recognizer
    RecognizerControl { listening: bool },

    /// Speak a phrase
    Speak { text: String },

    /// Cut off any phrase being spoken
    CancelSpeech,
}

/// Fan-out of shell commands to every attached shell
#[derive(Clone, Default)]
pub struct ShellLink {
    hosts: Arc<Mutex<Vec<mpsc::UnboundedSender<ShellCommand>>>>,
}

impl ShellLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shell; commands arrive on the returned receiver
    pub fn attach(&self) -> mpsc::UnboundedReceiver<ShellCommand> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        hosts.push(tx);
        debug!(hosts = hosts.len(), "shell attached");
        rx
    }

    /// Queue `command` for every live shell. Returns how many received it.
    pub fn send(&self, command: ShellCommand) -> usize {
        let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        hosts.retain(|host| host.send(command.clone()).is_ok());
        hosts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_hosts_delivers_nothing() {
        let link = ShellLink::new();
        assert_eq!(link.send(ShellCommand::CancelSpeech), 0);
    }

    #[test]
    fn test_detached_hosts_are_pruned() {
        let link = ShellLink::new();
        let mut kept = link.attach();
        let gone = link.attach();
        drop(gone);

        assert_eq!(link.send(ShellCommand::CancelSpeech), 1);
        assert_eq!(kept.try_recv().unwrap(), ShellCommand::CancelSpeech);
    }

    #[test]
    fn test_queue_is_not_lossy() {
        let link = ShellLink::new();
        let mut rx = link.attach();

        for _ in 0..1000 {
            link.send(ShellCommand::CancelSpeech);
        }
        link.send(ShellCommand::Speak {
            text: "Thank you".into(),
        });

        let mut last = None;
        let mut count = 0;
        while let Ok(command) = rx.try_recv() {
            count += 1;
            last = Some(command);
        }
        assert_eq!(count, 1001);
        assert_eq!(
            last,
            Some(ShellCommand::Speak {
                text: "Thank you".into()
            })
        );
    }

    #[test]
    fn test_command_serialization() {
        let json = serde_json::to_string(&ShellCommand::RecognizerControl { listening: false }).unwrap();
        assert_eq!(json, r#"{"type":"recognizer_control","listening":false}"#);
    }
}
