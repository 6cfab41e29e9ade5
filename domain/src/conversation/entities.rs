//! Conversation domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a turn in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error marker carried by an assistant turn that did not complete normally.
///
/// The turn's content holds the human-readable message; the marker records
/// which stage produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TurnError {
    /// Extracted arguments failed the schema; the tool was not invoked
    Validation(String),
    /// The tool or its finalize step failed
    Execution(String),
    /// The router chose a name missing from the registry
    ToolNotFound(String),
    /// Conversational generation failed
    Generation(String),
    /// The stream was cancelled before completion
    Cancelled,
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::Validation(msg) => write!(f, "validation: {}", msg),
            TurnError::Execution(msg) => write!(f, "execution: {}", msg),
            TurnError::ToolNotFound(name) => write!(f, "tool not found: {}", name),
            TurnError::Generation(msg) => write!(f, "generation: {}", msg),
            TurnError::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One utterance in a conversation (Entity). Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TurnError>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// An assistant turn marked with an error
    pub fn failed(content: impl Into<String>, error: TurnError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(Role::Assistant, content)
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Append-only turn history for a single conversation id.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    turns: Vec<Turn>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a context from persisted turns
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
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

    /// The trailing `n` turns (fewer if the history is shorter)
    pub fn window(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// The trailing `n` turns that precede the most recent one.
    ///
    /// Used when the latest utterance is placed in a prompt on its own.
    pub fn history_before_latest(&self, n: usize) -> &[Turn] {
        let end = self.turns.len().saturating_sub(1);
        let start = end.saturating_sub(n);
        &self.turns[start..end]
    }

    /// Content of the most recent user turn
    pub fn last_user_utterance(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
    }

    /// Render turns as `role: content` lines
    pub fn render(turns: &[Turn]) -> String {
        turns
            .iter()
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
