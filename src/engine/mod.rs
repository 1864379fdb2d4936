//! Session engine
//!
//! The single consumer of every event that can change session state: UI
//! requests, recognizer callbacks, expiry timers and network completions.
//! Each event is handled to completion before the next one is taken, so the
//! components it owns never see concurrent mutation.

mod dispatch;

pub use dispatch::{Engine, Timings};

use tokio::sync::oneshot;

use crate::error::ServiceError;
use crate::ipc::{Request, Response};
use crate::recognition::RecognizerCallback;
use crate::suggest::Suggestion;
use crate::transcript::LineId;

/// Everything the engine reacts to
#[derive(Debug)]
pub enum EngineEvent {
    /// A UI request; the reply is sent once it has been applied
    Request {
        request: Request,
        reply: Option<oneshot::Sender<Response>>,
    },

    /// A raw callback from the platform recognizer
    Recognizer(RecognizerCallback),

    /// A finalized transcript line reached the end of its lifetime
    LineExpired(LineId),

    /// The status message with this sequence number timed out
    StatusExpired(u64),

    /// A suggestion refresh finished
    SuggestionsResolved {
        request_id: u64,
        result: Result<Vec<Suggestion>, ServiceError>,
    },

    /// Outcome of the startup connectivity probe
    HealthChecked(Result<(), ServiceError>),
}
