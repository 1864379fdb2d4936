//! Transient status messages
//!
//! A single status line that clears itself after a fixed lifetime. Showing
//! a new message replaces the old one together with its timer.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::AbortHandle;
use tracing::debug;

use crate::engine::EngineEvent;
use crate::events::SessionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
    pub kind: StatusKind,
}

pub struct StatusLine {
    current: Option<StatusMessage>,
    /// Bumped on every `show`; expiries for older values are ignored
    seq: u64,
    lifetime: Duration,
    timer: Option<AbortHandle>,
    engine_tx: mpsc::Sender<EngineEvent>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl StatusLine {
    pub fn new(
        lifetime: Duration,
        engine_tx: mpsc::Sender<EngineEvent>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            current: None,
            seq: 0,
            lifetime,
            timer: None,
            engine_tx,
            event_tx,
        }
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }

    /// Show a message, replacing whatever is displayed
    pub fn show(&mut self, message: impl Into<String>, kind: StatusKind) {
        let message = message.into();
        debug!(%message, ?kind, "status");

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        self.seq += 1;
        self.current = Some(StatusMessage {
            message: message.clone(),
            kind,
        });
        let _ = self.event_tx.send(SessionEvent::Status { message, kind });

        let seq = self.seq;
        let lifetime = self.lifetime;
        let engine_tx = self.engine_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(lifetime).await;
            let _ = engine_tx.send(EngineEvent::StatusExpired(seq)).await;
        });
        self.timer = Some(handle.abort_handle());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.show(message, StatusKind::Info);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.show(message, StatusKind::Success);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.show(message, StatusKind::Error);
    }

    /// Clear the message if `seq` still names it. Returns whether it cleared.
    pub fn expire(&mut self, seq: u64) -> bool {
        if seq != self.seq || self.current.is_none() {
            return false;
        }

        self.current = None;
        self.timer = None;
        let _ = self.event_tx.send(SessionEvent::StatusCleared);
        true
    }
}
