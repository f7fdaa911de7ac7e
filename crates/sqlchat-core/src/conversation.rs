//! Conversation turn types.
//!
//! A [`Conversation`] is the ordered, append-only transcript of a session.
//! Turns are immutable once created; the transcript is only ever extended.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default assistant greeting used to seed a fresh conversation.
pub const DEFAULT_GREETING: &str =
    "Hello! I'm a SQL database assistant. Ask me anything about your database.";

/// Represents the author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Turn written by the person asking questions.
    User,
    /// Turn written by the assistant (answers, reports, failure notices).
    Assistant,
}

impl Role {
    /// Label used when the turn is rendered into prompt context.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "Human",
            Role::Assistant => "AI",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    text: String,
    /// Timestamp when the turn was created (ISO 8601 format).
    created_at: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }
}

/// Ordered transcript of a session.
///
/// Insertion order is significant: turns are rendered verbatim, in order, as
/// prompt context. There is no way to remove or edit a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a conversation whose first turn is an assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::assistant(greeting)],
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Renders the transcript as prompt context, one `Role: text` entry per turn.
    ///
    /// An empty conversation renders as `(no previous messages)` so templates
    /// never receive a blank slot.
    pub fn render(&self) -> String {
        render_turns(&self.turns)
    }
}

/// Renders a slice of turns in the same format as [`Conversation::render`].
pub fn render_turns(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "(no previous messages)".to_string();
    }

    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role(), turn.text()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_conversation_is_empty() {
        let conversation = Conversation::new();
        assert!(conversation.is_empty());
        assert_eq!(conversation.render(), "(no previous messages)");
    }

    #[test]
    fn greeting_is_first_assistant_turn() {
        let conversation = Conversation::with_greeting(DEFAULT_GREETING);
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.turns()[0].role(), Role::Assistant);
        assert_eq!(conversation.turns()[0].text(), DEFAULT_GREETING);
    }

    #[test]
    fn render_keeps_insertion_order() {
        let mut conversation = Conversation::new();
        conversation.push(Turn::user("How many terminals are active?"));
        conversation.push(Turn::assistant("There are 12 active terminals."));
        conversation.push(Turn::user("And inactive?"));

        assert_eq!(
            conversation.render(),
            "Human: How many terminals are active?\n\
             AI: There are 12 active terminals.\n\
             Human: And inactive?"
        );
    }

    #[test]
    fn turn_serializes_role_in_lowercase() {
        let json = serde_json::to_value(Turn::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["text"], "hi");
    }
}
