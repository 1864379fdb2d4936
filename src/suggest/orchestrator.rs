//! Suggestion orchestrator
//!
//! Refreshes run as spawned tasks that post their outcome back to the engine.
//! Outcomes are applied in the order they resolve, so the last response to
//! arrive is the one displayed. A failed refresh never touches the displayed
//! set.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::engine::EngineEvent;
use crate::error::{ServiceError, SynthesisError};
use crate::events::SessionEvent;
use crate::session::Session;
use crate::speech::UtterancePresenter;
use crate::transcript::Reconciler;

use super::{LogChoice, SuggestMode, Suggestion, SuggestionRequest, SuggestionService, CUSTOM_CHOICE};

/// What the user picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// One of the displayed suggestions
    Suggestion(Suggestion),
    /// A reply typed by the user
    FreeText(String),
}

impl Choice {
    fn text(&self) -> &str {
        match self {
            Choice::Suggestion(s) => &s.text,
            Choice::FreeText(text) => text,
        }
    }
}

pub struct SuggestionOrchestrator {
    service: Arc<dyn SuggestionService>,
    displayed: Vec<Suggestion>,
    next_request_id: u64,
    engine_tx: mpsc::Sender<EngineEvent>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SuggestionOrchestrator {
    pub fn new(
        service: Arc<dyn SuggestionService>,
        engine_tx: mpsc::Sender<EngineEvent>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            service,
            displayed: Vec::new(),
            next_request_id: 1,
            engine_tx,
            event_tx,
        }
    }

    /// Currently displayed suggestions
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.displayed
    }

    pub fn find(&self, id: &str) -> Option<&Suggestion> {
        self.displayed.iter().find(|s| s.id == id)
    }

    /// Build the request payload for the current session
    pub fn build_request(session: &Session, mode: SuggestMode) -> SuggestionRequest {
        SuggestionRequest {
            session_id: session.id(),
            last_text: session.transcript().to_string(),
            context: session.context_value().to_string(),
            mode,
        }
    }

    /// Issue a refresh. Returns the request id its outcome will carry.
    pub fn refresh(&mut self, session: &Session, mode: SuggestMode) -> u64 {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let request = Self::build_request(session, mode);
        info!(
            request_id,
            context = %request.context,
            ?mode,
            "requesting suggestions"
        );

        let service = Arc::clone(&self.service);
        let engine_tx = self.engine_tx.clone();
        tokio::spawn(async move {
            let result = service.suggest(request).await;
            let _ = engine_tx
                .send(EngineEvent::SuggestionsResolved { request_id, result })
                .await;
        });

        request_id
    }

    /// Apply a resolved refresh
    pub fn on_resolved(
        &mut self,
        request_id: u64,
        result: Result<Vec<Suggestion>, ServiceError>,
    ) -> Result<(), ServiceError> {
        match result {
            Ok(suggestions) => {
                debug!(request_id, count = suggestions.len(), "suggestions resolved");
                self.replace(suggestions);
                Ok(())
            }
            Err(e) => {
                warn!(request_id, error = %e, "suggestion request failed, keeping previous set");
                Err(e)
            }
        }
    }

    /// Speak the chosen reply, then log the choice in the background.
    ///
    /// Logging is best effort: failures are logged and otherwise ignored.
    /// The displayed suggestions are forgotten once one is chosen.
    pub fn choose(
        &mut self,
        choice: Choice,
        session: &Session,
        presenter: &mut UtterancePresenter,
        reconciler: &mut Reconciler,
    ) -> Result<(), SynthesisError> {
        let (_, synthesis) = presenter.speak(choice.text(), reconciler);

        let entry = match choice {
            Choice::Suggestion(s) => LogChoice {
                session_id: session.id(),
                suggestion_id: s.id,
                context: session.context_value().to_string(),
                intent: s.intent,
                text: s.text,
            },
            Choice::FreeText(text) => LogChoice {
                session_id: session.id(),
                suggestion_id: CUSTOM_CHOICE.to_string(),
                context: session.context_value().to_string(),
                intent: CUSTOM_CHOICE.to_string(),
                text,
            },
        };

        let service = Arc::clone(&self.service);
        tokio::spawn(async move {
            let suggestion_id = entry.suggestion_id.clone();
            match service.log_choice(entry).await {
                Ok(()) => debug!(%suggestion_id, "choice logged"),
                Err(e) => warn!(%suggestion_id, error = %e, "log choice failed"),
            }
        });

        if !self.displayed.is_empty() {
            self.replace(Vec::new());
        }

        synthesis
    }

    fn replace(&mut self, suggestions: Vec<Suggestion>) {
        self.displayed = suggestions;
        let _ = self.event_tx.send(SessionEvent::SuggestionsUpdated {
            suggestions: self.displayed.clone(),
        });
    }
}
