//! Conversation session
//!
//! One `Session` exists per daemon run. It is owned by the engine and lent to
//! the components that read or extend it; nothing here is global.

mod context;

pub use context::{Context, ContextKind};

use uuid::Uuid;

/// Context value sent to the suggestion service before one is selected
pub const DEFAULT_CONTEXT_VALUE: &str = "generic";

/// A single conversation session
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    context: Option<Context>,
    /// Every finalized user segment, each followed by a single space
    transcript: String,
}

impl Session {
    /// Create a session with a freshly generated identifier
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            context: None,
            transcript: String::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Value sent as `context` on suggestion and log requests
    pub fn context_value(&self) -> &str {
        self.context
            .as_ref()
            .map(|c| c.kind.value())
            .unwrap_or(DEFAULT_CONTEXT_VALUE)
    }

    pub fn select_context(&mut self, context: Context) {
        self.context = Some(context);
    }

    /// Full accumulated transcript of what the user has said
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Append a finalized segment to the accumulated transcript
    pub(crate) fn append_segment(&mut self, text: &str) {
        self.transcript.push_str(text);
        self.transcript.push(' ');
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
