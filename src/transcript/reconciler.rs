//! Transcript reconciliation
//!
//! Turns the recognizer's interim/final stream into a stable set of displayed
//! lines. An interim line is promoted in place when its final segment arrives,
//! so one utterance never shows up twice.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::trace;

use crate::engine::EngineEvent;
use crate::session::Session;

use super::{LineId, LineStatus, Speaker, TranscriptLine};

/// Outcome of applying a final segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// The live interim line became final
    Promoted(LineId),
    /// No interim line existed; a new final line was added
    Appended(LineId),
}

impl Reconciled {
    pub fn id(self) -> LineId {
        match self {
            Reconciled::Promoted(id) | Reconciled::Appended(id) => id,
        }
    }
}

/// Owner of the displayed transcript lines
pub struct Reconciler {
    /// Display order, oldest first
    lines: Vec<TranscriptLine>,
    /// The single interim line, if someone is speaking
    interim: Option<LineId>,
    next_id: LineId,
    lifetime: Duration,
    /// Pending expiry timers, aborted when a line goes away early
    expiries: HashMap<LineId, AbortHandle>,
    engine_tx: mpsc::Sender<EngineEvent>,
}

impl Reconciler {
    /// Create a reconciler whose final lines live for `lifetime`
    pub fn new(lifetime: Duration, engine_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            lines: Vec::new(),
            interim: None,
            next_id: 1,
            lifetime,
            expiries: HashMap::new(),
            engine_tx,
        }
    }

    /// Lines currently on screen, oldest first
    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    #[cfg(test)]
    pub fn interim(&self) -> Option<&TranscriptLine> {
        let id = self.interim?;
        self.lines.iter().find(|line| line.id == id)
    }

    /// Apply an interim hypothesis. Returns true if the display changed.
    pub fn on_interim(&mut self, text: &str) -> bool {
        let text = text.trim();

        if text.is_empty() {
            return self.clear_interim();
        }

        match self.interim_mut() {
            Some(line) => {
                if line.text == text {
                    return false;
                }
                line.text = text.to_string();
            }
            None => {
                let id = self.push_line(Speaker::User, text, LineStatus::Interim);
                self.interim = Some(id);
                trace!(id, "interim line created");
            }
        }
        true
    }

    /// Apply a final segment, promoting the interim line when there is one
    pub fn on_final(&mut self, text: &str, session: &mut Session) -> Reconciled {
        let promoted = self.interim_mut().map(|line| {
            line.text = text.to_string();
            line.status = LineStatus::Final;
            line.speaker = Speaker::User;
            line.id
        });
        self.interim = None;

        let outcome = match promoted {
            Some(id) => Reconciled::Promoted(id),
            None => Reconciled::Appended(self.push_line(Speaker::User, text, LineStatus::Final)),
        };

        session.append_segment(text);
        self.schedule_expiry(outcome.id());

        outcome
    }

    /// Record a phrase spoken on the user's behalf
    pub fn add_assistant_turn(&mut self, text: &str) -> LineId {
        let id = self.push_line(Speaker::Assistant, text, LineStatus::Final);
        self.schedule_expiry(id);
        id
    }

    /// Remove an expired line. Returns false if it was already gone.
    pub fn expire(&mut self, id: LineId) -> bool {
        self.expiries.remove(&id);
        self.remove_line(id)
    }

    /// Drop the interim line, if any
    pub fn clear_interim(&mut self) -> bool {
        match self.interim.take() {
            Some(id) => self.remove_line(id),
            None => false,
        }
    }

    /// Remove every displayed line and cancel all pending expiries
    pub fn clear(&mut self) {
        for (_, handle) in self.expiries.drain() {
            handle.abort();
        }
        self.lines.clear();
        self.interim = None;
    }

    fn interim_mut(&mut self) -> Option<&mut TranscriptLine> {
        let id = self.interim?;
        self.lines
            .iter_mut()
            .find(|line| line.id == id && line.is_interim())
    }

    fn push_line(&mut self, speaker: Speaker, text: &str, status: LineStatus) -> LineId {
        let id = self.next_id;
        self.next_id += 1;
        self.lines.push(TranscriptLine {
            id,
            speaker,
            text: text.to_string(),
            created_at: Utc::now(),
            status,
        });
        id
    }

    fn remove_line(&mut self, id: LineId) -> bool {
        if let Some(handle) = self.expiries.remove(&id) {
            handle.abort();
        }
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        self.lines.len() != before
    }

    fn schedule_expiry(&mut self, id: LineId) {
        let deadline = Instant::now() + self.lifetime;
        let engine_tx = self.engine_tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = engine_tx.send(EngineEvent::LineExpired(id)).await;
        });

        self.expiries.insert(id, handle.abort_handle());
    }
}

impl Drop for Reconciler {
    fn drop(&mut self) {
        for (_, handle) in self.expiries.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIFETIME: Duration = Duration::from_secs(5);

    fn create_reconciler() -> (Reconciler, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(16);
        (Reconciler::new(LIFETIME, tx), rx)
    }

    async fn next_expiry(rx: &mut mpsc::Receiver<EngineEvent>) -> LineId {
        match rx.recv().await {
            Some(EngineEvent::LineExpired(id)) => id,
            other => panic!("expected line expiry, got {:?}", other),
        }
    }

    fn interim_count(r: &Reconciler) -> usize {
        r.lines().iter().filter(|l| l.is_interim()).count()
    }

    #[tokio::test]
    async fn test_interim_created_then_overwritten() {
        let (mut r, _rx) = create_reconciler();

        assert!(r.on_interim("I need"));
        assert!(r.on_interim("I need wat"));
        assert_eq!(r.lines().len(), 1);
        assert_eq!(r.interim().unwrap().text, "I need wat");
    }

    #[tokio::test]
    async fn test_empty_interim_removes_live_line() {
        let (mut r, _rx) = create_reconciler();

        r.on_interim("hello");
        assert!(r.on_interim("   "));
        assert!(r.interim().is_none());
        assert!(r.lines().is_empty());
        assert!(!r.on_interim(""));
    }

    #[tokio::test]
    async fn test_final_promotes_interim_in_place() {
        let (mut r, _rx) = create_reconciler();
        let mut session = Session::new();

        r.add_assistant_turn("Hello");
        r.on_interim("I need wa");
        let interim_id = r.interim().unwrap().id;
        r.add_assistant_turn("One moment please");

        let outcome = r.on_final("I need water", &mut session);

        assert_eq!(outcome, Reconciled::Promoted(interim_id));
        assert!(r.interim().is_none());
        assert_eq!(r.lines().len(), 3);
        let promoted = &r.lines()[1];
        assert_eq!(promoted.id, interim_id);
        assert_eq!(promoted.text, "I need water");
        assert_eq!(promoted.status, LineStatus::Final);
        assert_eq!(promoted.speaker, Speaker::User);
        assert_eq!(session.transcript(), "I need water ");
    }

    #[tokio::test]
    async fn test_final_without_interim_appends() {
        let (mut r, _rx) = create_reconciler();
        let mut session = Session::new();

        let outcome = r.on_final("Good morning", &mut session);

        assert!(matches!(outcome, Reconciled::Appended(_)));
        assert_eq!(r.lines().len(), 1);
        assert_eq!(r.lines()[0].status, LineStatus::Final);
    }

    #[tokio::test]
    async fn test_assistant_turn_does_not_touch_session_transcript() {
        let (mut r, _rx) = create_reconciler();
        let mut session = Session::new();

        r.on_final("Are you cold", &mut session);
        r.add_assistant_turn("Yes");

        assert_eq!(session.transcript(), "Are you cold ");
        assert_eq!(r.lines()[1].speaker, Speaker::Assistant);
    }

    #[tokio::test]
    async fn test_event_sequences_keep_one_interim_line() {
        let (mut r, _rx) = create_reconciler();
        let mut session = Session::new();
        let steps: &[(&str, bool)] = &[
            ("hi", false),
            ("hi there", false),
            ("hi there", true),
            ("", false),
            ("how", false),
            ("how are you", true),
            ("fine", true),
            ("and", false),
            ("and you", false),
            ("", false),
            ("bye", true),
        ];

        for (text, is_final) in steps {
            let before = r.lines().len();
            let had_interim = r.interim().is_some();

            if *is_final {
                match r.on_final(text, &mut session) {
                    Reconciled::Promoted(_) => {
                        assert!(had_interim);
                        assert_eq!(r.lines().len(), before);
                    }
                    Reconciled::Appended(_) => {
                        assert!(!had_interim);
                        assert_eq!(r.lines().len(), before + 1);
                    }
                }
            } else {
                r.on_interim(text);
            }

            assert!(interim_count(&r) <= 1);
        }

        assert_eq!(session.transcript(), "hi there how are you fine bye ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_line_expires_after_lifetime() {
        let (mut r, mut rx) = create_reconciler();
        let mut session = Session::new();
        let start = Instant::now();

        let id = r.on_final("I need water", &mut session).id();
        let expired = next_expiry(&mut rx).await;

        assert_eq!(expired, id);
        assert_eq!(start.elapsed(), LIFETIME);
        assert!(r.expire(expired));
        assert!(r.lines().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_independent_per_line() {
        let (mut r, mut rx) = create_reconciler();
        let mut session = Session::new();
        let start = Instant::now();

        let first = r.on_final("first", &mut session).id();
        tokio::time::sleep(Duration::from_secs(2)).await;
        let second = r.add_assistant_turn("second");

        assert_eq!(next_expiry(&mut rx).await, first);
        r.expire(first);
        assert_eq!(r.lines().len(), 1);
        assert_eq!(r.lines()[0].id, second);

        assert_eq!(next_expiry(&mut rx).await, second);
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_pending_expiries() {
        let (mut r, mut rx) = create_reconciler();

        r.add_assistant_turn("Thank you");
        r.on_interim("uh");
        r.clear();
        assert!(r.lines().is_empty());
        assert!(r.interim().is_none());

        tokio::time::sleep(LIFETIME * 2).await;
        assert!(rx.try_recv().is_err());
    }
}
