//! Reply suggestions
//!
//! Request/response types for the remote suggestion service, the
//! `SuggestionService` seam, its HTTP implementation and the orchestrator
//! that keeps the displayed suggestion set.

mod client;
mod orchestrator;

pub use client::HttpSuggestionClient;
pub use orchestrator::{Choice, SuggestionOrchestrator};

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceError;

/// Suggestion id and intent logged for a free-text reply
pub const CUSTOM_CHOICE: &str = "custom";

/// Boxed future returned by `SuggestionService` calls
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ServiceError>> + Send + 'a>>;

/// A candidate reply phrase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub text: String,
    pub intent: String,
}

/// Which flow a refresh belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestMode {
    /// Plain conversation replies
    Chat,
    /// Replies biased by the selected context
    #[default]
    Contextual,
}

/// Body of `POST /suggest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub session_id: Uuid,
    pub last_text: String,
    pub context: String,
    pub mode: SuggestMode,
}

/// Body of a successful `POST /suggest` response
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

/// Body of `POST /log_choice`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogChoice {
    pub session_id: Uuid,
    pub suggestion_id: String,
    pub context: String,
    pub intent: String,
    pub text: String,
}

/// Remote suggestion and choice-logging service (dyn-compatible)
pub trait SuggestionService: Send + Sync {
    /// Fetch reply suggestions for the accumulated transcript
    fn suggest(&self, request: SuggestionRequest) -> ServiceFuture<'_, Vec<Suggestion>>;

    /// Record which reply the user picked
    fn log_choice(&self, choice: LogChoice) -> ServiceFuture<'_, ()>;

    /// Connectivity probe
    fn health(&self) -> ServiceFuture<'_, ()>;
}
