//! Core recording state machine
//!
//! The only mutator of recording state and the only caller of the
//! recognition adapter's start/stop.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::RecognitionError;
use crate::events::SessionEvent;
use crate::recognition::RecognitionAdapter;

/// The three recording states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    /// Recording has not been started
    #[default]
    Idle,
    /// The recognizer is capturing
    Active,
    /// Capture stopped by the user; resumable
    Paused,
}

impl std::fmt::Display for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "Idle"),
            RecordingState::Active => write!(f, "Active"),
            RecordingState::Paused => write!(f, "Paused"),
        }
    }
}

/// State machine gating the recognition adapter
pub struct RecordingStateMachine {
    /// Current state
    state: RecordingState,
    /// Time when the current state was entered
    state_entered_at: Instant,
    adapter: RecognitionAdapter,
    /// Channel for emitting state events
    event_tx: broadcast::Sender<SessionEvent>,
}

impl RecordingStateMachine {
    /// Create a new state machine in `Idle`
    pub fn new(adapter: RecognitionAdapter, event_tx: broadcast::Sender<SessionEvent>) -> Self {
        Self {
            state: RecordingState::Idle,
            state_entered_at: Instant::now(),
            adapter,
            event_tx,
        }
    }

    /// Get the current state
    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Whether a recognizer is available at all
    pub fn is_supported(&self) -> bool {
        self.adapter.is_supported()
    }

    /// Start (or resume) recording.
    ///
    /// A no-op while already `Active`. If the recognizer refuses to start the
    /// state is left unchanged. Returns whether a transition happened.
    pub fn start(&mut self) -> Result<bool, RecognitionError> {
        if self.state == RecordingState::Active {
            debug!("start requested while already active");
            return Ok(false);
        }

        self.adapter.start()?;
        self.transition_to(RecordingState::Active);
        Ok(true)
    }

    /// Pause recording. Returns whether a transition happened.
    pub fn pause(&mut self) -> bool {
        if self.state != RecordingState::Active {
            debug!(state = %self.state, "pause requested while not active");
            return false;
        }

        // State first, so a late end-of-stream sees Paused
        self.transition_to(RecordingState::Paused);
        self.adapter.stop();
        true
    }

    /// Resume a paused recording
    pub fn resume(&mut self) -> Result<bool, RecognitionError> {
        if self.state != RecordingState::Paused {
            debug!(state = %self.state, "resume requested while not paused");
            return Ok(false);
        }
        self.start()
    }

    /// Pause when active, otherwise start
    pub fn toggle(&mut self) -> Result<bool, RecognitionError> {
        match self.state {
            RecordingState::Active => Ok(self.pause()),
            RecordingState::Idle | RecordingState::Paused => self.start(),
        }
    }

    /// Forward an unsolicited end-of-stream to the adapter.
    ///
    /// The adapter may restart itself; this never changes the state.
    pub fn on_recognizer_ended(&mut self) -> Result<bool, RecognitionError> {
        self.adapter.on_ended(self.state)
    }

    /// Perform a state transition
    fn transition_to(&mut self, new_state: RecordingState) {
        let old_state = self.state;
        let duration_ms = self.state_entered_at.elapsed().as_millis() as u64;

        info!(
            from = %old_state,
            to = %new_state,
            duration_ms = duration_ms,
            "recording state transition"
        );

        self.state = new_state;
        self.state_entered_at = Instant::now();

        let event = SessionEvent::RecordingStateChanged {
            from: old_state,
            to: new_state,
        };
        if self.event_tx.send(event).is_err() {
            // No subscribers yet
            debug!("recording state event dropped");
        }
    }
}

impl Drop for RecordingStateMachine {
    fn drop(&mut self) {
        if self.adapter.is_listening() {
            warn!("state machine dropped while recognizer listening, stopping");
            self.adapter.stop();
        }
    }
}
