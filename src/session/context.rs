//! Conversation contexts used to bias suggestions

use serde::{Deserialize, Serialize};

/// Predefined conversational domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    Medical,
    Restaurant,
    Shopping,
    Work,
    Family,
    Others,
    /// Free-text-only context; the qualifier is its label
    Custom,
}

impl ContextKind {
    /// Every selectable context, in display order
    pub const ALL: [ContextKind; 6] = [
        ContextKind::Medical,
        ContextKind::Restaurant,
        ContextKind::Shopping,
        ContextKind::Work,
        ContextKind::Family,
        ContextKind::Others,
    ];

    /// Wire value sent to the suggestion service
    pub fn value(self) -> &'static str {
        match self {
            ContextKind::Medical => "medical",
            ContextKind::Restaurant => "restaurant",
            ContextKind::Shopping => "shopping",
            ContextKind::Work => "work",
            ContextKind::Family => "family",
            ContextKind::Others => "others",
            ContextKind::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContextKind::Medical => "Medical",
            ContextKind::Restaurant => "Restaurant",
            ContextKind::Shopping => "Shopping",
            ContextKind::Work => "Work",
            ContextKind::Family => "Family",
            ContextKind::Others => "Others",
            ContextKind::Custom => "Custom",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            ContextKind::Medical => "🏥",
            ContextKind::Restaurant => "🍽️",
            ContextKind::Shopping => "🛒",
            ContextKind::Work => "💼",
            ContextKind::Family => "👨‍👩‍👧‍👦",
            ContextKind::Others => "💬",
            ContextKind::Custom => "🗣️",
        }
    }
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// A selected context plus optional free-text qualifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub kind: ContextKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl Context {
    /// Build a context, discarding a blank qualifier
    pub fn new(kind: ContextKind, qualifier: Option<String>) -> Self {
        let qualifier = qualifier
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        Self { kind, qualifier }
    }

    /// Human-readable label, e.g. "Medical - dentist"
    pub fn label(&self) -> String {
        match (&self.kind, &self.qualifier) {
            (ContextKind::Custom, Some(q)) => q.clone(),
            (kind, Some(q)) => format!("{} - {}", kind.label(), q),
            (kind, None) => kind.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_with_qualifier() {
        let ctx = Context::new(ContextKind::Medical, Some(" dentist ".into()));
        assert_eq!(ctx.label(), "Medical - dentist");
    }

    #[test]
    fn test_blank_qualifier_is_dropped() {
        let ctx = Context::new(ContextKind::Work, Some("   ".into()));
        assert_eq!(ctx.qualifier, None);
        assert_eq!(ctx.label(), "Work");
    }

    #[test]
    fn test_custom_label_is_qualifier() {
        let ctx = Context::new(ContextKind::Custom, Some("Bank visit".into()));
        assert_eq!(ctx.label(), "Bank visit");
        assert_eq!(ctx.kind.value(), "custom");
    }

    #[test]
    fn test_kind_deserialization() {
        let kind: ContextKind = serde_json::from_str(r#""restaurant""#).unwrap();
        assert_eq!(kind, ContextKind::Restaurant);
    }
}
