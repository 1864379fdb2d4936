//! Event dispatch for the session engine

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::error::{RecognitionError, SynthesisError};
use crate::events::SessionEvent;
use crate::ipc::{Request, Response, SessionStatus};
use crate::phrases::{context_options, GENERIC_PHRASES};
use crate::platform::Platform;
use crate::recognition::{RecognitionAdapter, RecognitionEvent, RecognizerCallback};
use crate::session::{Context, ContextKind, Session};
use crate::state::{RecordingState, RecordingStateMachine};
use crate::status::StatusLine;
use crate::suggest::{Choice, SuggestionOrchestrator, SuggestionService};
use crate::transcript::{Reconciled, Reconciler};
use crate::speech::UtterancePresenter;

use super::EngineEvent;

/// Display lifetimes used by the engine
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub line_lifetime: Duration,
    pub status_lifetime: Duration,
}

impl From<&Config> for Timings {
    fn from(config: &Config) -> Self {
        Self {
            line_lifetime: config.line_lifetime,
            status_lifetime: config.status_lifetime,
        }
    }
}

/// Owner of the session and every component that acts on it
pub struct Engine {
    session: Session,
    reconciler: Reconciler,
    recording: RecordingStateMachine,
    orchestrator: SuggestionOrchestrator,
    presenter: UtterancePresenter,
    status: StatusLine,
    event_tx: broadcast::Sender<SessionEvent>,
    started_at: Instant,
}

impl Engine {
    pub fn new(
        timings: Timings,
        platform: Platform,
        service: Arc<dyn SuggestionService>,
        engine_tx: mpsc::Sender<EngineEvent>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let session = Session::new();
        info!(session_id = %session.id(), "session created");

        Self {
            session,
            reconciler: Reconciler::new(timings.line_lifetime, engine_tx.clone()),
            recording: RecordingStateMachine::new(
                RecognitionAdapter::new(platform.recognizer),
                event_tx.clone(),
            ),
            orchestrator: SuggestionOrchestrator::new(service, engine_tx.clone(), event_tx.clone()),
            presenter: UtterancePresenter::new(platform.synthesizer),
            status: StatusLine::new(timings.status_lifetime, engine_tx, event_tx.clone()),
            event_tx,
            started_at: Instant::now(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Process events until every sender is gone
    pub async fn run(&mut self, mut engine_rx: mpsc::Receiver<EngineEvent>) {
        info!("session engine started");

        while let Some(event) = engine_rx.recv().await {
            self.handle(event);
        }

        info!("session engine stopped");
    }

    /// Apply a single event to completion
    pub fn handle(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Request { request, reply } => {
                let response = self.handle_request(request);
                if let Some(reply) = reply {
                    let _ = reply.send(response);
                }
            }
            EngineEvent::Recognizer(callback) => self.on_recognizer(callback),
            EngineEvent::LineExpired(id) => {
                if self.reconciler.expire(id) {
                    trace!(id, "transcript line expired");
                    self.publish_transcript();
                }
            }
            EngineEvent::StatusExpired(seq) => {
                self.status.expire(seq);
            }
            EngineEvent::SuggestionsResolved { request_id, result } => {
                match self.orchestrator.on_resolved(request_id, result) {
                    Ok(()) => self.status.success("Suggestions refreshed"),
                    Err(_) => self.status.error("Failed to fetch suggestions"),
                }
            }
            EngineEvent::HealthChecked(result) => match result {
                Ok(()) => {
                    info!("suggestion service reachable");
                    self.status.success("Backend connected");
                }
                Err(e) => {
                    warn!(error = %e, "suggestion service unreachable");
                    self.status
                        .error("Backend not connected - some features may not work");
                }
            },
        }
    }

    fn handle_request(&mut self, request: Request) -> Response {
        match request {
            Request::Ping => Response::Pong,
            Request::GetStatus => Response::Status(self.snapshot()),
            Request::Subscribe => {
                Response::error("not_supported", "subscriptions are handled by the socket server")
            }
            Request::ListPhrases => Response::Phrases {
                generic: GENERIC_PHRASES.iter().map(|p| p.to_string()).collect(),
                contexts: context_options(),
            },
            Request::SelectContext { context, qualifier } => self.select_context(context, qualifier),
            Request::StartRecording => {
                let started = self.recording.start();
                self.after_start(started)
            }
            Request::ResumeRecording => {
                let resumed = self.recording.resume();
                self.after_start(resumed)
            }
            Request::PauseRecording => {
                let paused = self.recording.pause();
                self.after_pause(paused);
                Response::Ok
            }
            Request::ToggleRecording => {
                let was_active = self.recording.state() == RecordingState::Active;
                let toggled = self.recording.toggle();
                if was_active {
                    self.after_pause(matches!(toggled, Ok(true)));
                    Response::Ok
                } else {
                    self.after_start(toggled)
                }
            }
            Request::RefreshSuggestions { mode } => {
                let request_id = self.orchestrator.refresh(&self.session, mode);
                Response::Refreshing { request_id }
            }
            Request::ChooseSuggestion { id } => {
                let Some(suggestion) = self.orchestrator.find(&id).cloned() else {
                    return Response::error("unknown_suggestion", format!("no suggestion with id {}", id));
                };
                self.choose(Choice::Suggestion(suggestion));
                Response::Ok
            }
            Request::SubmitReply { text } => {
                let text = text.trim();
                if text.is_empty() {
                    return Response::error("empty_text", "reply text is empty");
                }
                self.choose(Choice::FreeText(text.to_string()));
                Response::Ok
            }
            Request::SpeakPhrase { text } => {
                let text = text.trim();
                if text.is_empty() {
                    return Response::error("empty_text", "phrase text is empty");
                }
                let (_, synthesis) = self.presenter.speak(text, &mut self.reconciler);
                self.report_synthesis(synthesis);
                self.publish_transcript();
                Response::Ok
            }
            Request::ClearTranscript => {
                self.reconciler.clear();
                self.publish_transcript();
                Response::Ok
            }
            request @ (Request::RecognizerResults { .. }
            | Request::RecognizerEnded
            | Request::RecognizerError { .. }) => {
                if let Ok(callback) = request.into_recognizer_callback() {
                    self.on_recognizer(callback);
                }
                Response::Ok
            }
        }
    }

    fn select_context(&mut self, kind: ContextKind, qualifier: Option<String>) -> Response {
        let context = Context::new(kind, qualifier);
        if context.kind == ContextKind::Custom && context.qualifier.is_none() {
            return Response::error("invalid_context", "a custom context needs a description");
        }

        info!(context = %context.kind, label = %context.label(), "context selected");
        self.session.select_context(context);
        Response::Ok
    }

    fn after_start(&mut self, started: Result<bool, RecognitionError>) -> Response {
        match started {
            Ok(true) => {
                self.status.info("Recording conversation...");
                Response::Ok
            }
            Ok(false) => Response::Ok,
            Err(e) => {
                warn!(error = %e, "could not start recording");
                let message = recognition_message(&e);
                self.status.error(message.clone());
                let code = match e {
                    RecognitionError::Unsupported => "recognition_unsupported",
                    RecognitionError::HostUnavailable => "host_unavailable",
                    _ => "recognition_failed",
                };
                Response::error(code, message)
            }
        }
    }

    fn after_pause(&mut self, paused: bool) {
        if !paused {
            return;
        }
        if self.reconciler.clear_interim() {
            self.publish_transcript();
        }
        self.status.info("Recording paused");
    }

    fn choose(&mut self, choice: Choice) {
        let synthesis = self.orchestrator.choose(
            choice,
            &self.session,
            &mut self.presenter,
            &mut self.reconciler,
        );
        self.report_synthesis(synthesis);
        self.publish_transcript();
    }

    /// Normalize a recognizer callback and apply the resulting events in order
    fn on_recognizer(&mut self, callback: RecognizerCallback) {
        let mut changed = false;

        for event in RecognitionAdapter::normalize(callback) {
            match event {
                RecognitionEvent::Interim(text) => {
                    if self.recording.state() == RecordingState::Active {
                        changed |= self.reconciler.on_interim(&text);
                    } else if !text.is_empty() {
                        trace!(state = %self.recording.state(), "interim dropped while not recording");
                    }
                }
                RecognitionEvent::Final(text) => {
                    match self.reconciler.on_final(&text, &mut self.session) {
                        Reconciled::Promoted(id) => trace!(id, "interim line finalized"),
                        Reconciled::Appended(id) => trace!(id, "final line appended"),
                    }
                    changed = true;
                }
                RecognitionEvent::Ended => match self.recording.on_recognizer_ended() {
                    Ok(restarted) => debug!(restarted, "recognizer end-of-stream"),
                    Err(e) => self.status.error(recognition_message(&e)),
                },
                RecognitionEvent::Error(e) => {
                    warn!(error = %e, "recognizer error");
                    self.status.error(recognition_message(&e));
                }
            }
        }

        if changed {
            self.publish_transcript();
        }
    }

    fn report_synthesis(&mut self, synthesis: Result<(), SynthesisError>) {
        match synthesis {
            Ok(()) => {}
            Err(SynthesisError::Unsupported) => self.status.error("Speech synthesis not supported"),
            Err(SynthesisError::Failed(_)) => self.status.error("Speech synthesis failed"),
        }
    }

    fn publish_transcript(&self) {
        let _ = self.event_tx.send(SessionEvent::TranscriptChanged {
            lines: self.reconciler.lines().to_vec(),
        });
    }

    fn snapshot(&self) -> SessionStatus {
        SessionStatus {
            version: env!("CARGO_PKG_VERSION").to_string(),
            session_id: self.session.id(),
            context: self.session.context().cloned(),
            context_label: self.session.context().map(|c| c.label()),
            recording: self.recording.state(),
            recognizer_supported: self.recording.is_supported(),
            synthesizer_supported: self.presenter.is_supported(),
            transcript: self.session.transcript().to_string(),
            lines: self.reconciler.lines().to_vec(),
            suggestions: self.orchestrator.suggestions().to_vec(),
            status: self.status.current().cloned(),
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }
}

/// User-facing status text for a recognition failure
fn recognition_message(error: &RecognitionError) -> String {
    match error {
        RecognitionError::Unsupported => "Speech recognition not supported".to_string(),
        RecognitionError::StartFailed(_) => "Microphone access denied".to_string(),
        RecognitionError::HostUnavailable => "No speech host connected".to_string(),
        RecognitionError::NoSpeech => "No speech detected".to_string(),
        RecognitionError::RestartFailed(_) => "Could not restart recognition".to_string(),
        RecognitionError::Other(code) => format!("Recognition error: {}", code),
    }
}
