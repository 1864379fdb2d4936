//! Generic reply phrases and the selectable context catalog

use serde::{Deserialize, Serialize};

use crate::session::ContextKind;

/// Phrases offered regardless of context
pub const GENERIC_PHRASES: [&str; 16] = [
    "Yes",
    "No",
    "Maybe",
    "I don't know",
    "Can you repeat that?",
    "I need help",
    "Thank you",
    "Excuse me",
    "I understand",
    "Please wait",
    "I'm sorry",
    "One moment please",
    "I agree",
    "I disagree",
    "Could you speak slower?",
    "I'm ready",
];

/// One entry of the context picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextOption {
    pub emoji: String,
    pub label: String,
    pub value: ContextKind,
}

/// Every selectable context, in display order
pub fn context_options() -> Vec<ContextOption> {
    ContextKind::ALL
        .iter()
        .map(|kind| ContextOption {
            emoji: kind.emoji().to_string(),
            label: kind.label().to_string(),
            value: *kind,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_options() {
        let options = context_options();
        assert_eq!(options.len(), 6);
        assert_eq!(options[0].label, "Medical");
        assert!(options.iter().all(|o| o.value != ContextKind::Custom));
    }
}
