//! Conversation transcript port
//!
//! The orchestrator reports what happened during each turn as
//! [`ConversationEvent`]s. Diagnostics go through `tracing`; this port is the
//! machine-readable record of routing decisions and tool activity.

use serde_json::Value;
use std::fmt;

/// What a transcript record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The router picked a tool or none
    RouteDecision,
    /// Validated arguments are about to reach a capability
    ToolCall,
    /// A capability returned, successfully or not
    ToolResult,
    /// Extracted arguments failed the schema
    ValidationFailed,
    /// An assistant turn was recorded
    TurnCompleted,
    /// Routing failed and no assistant turn was recorded
    TurnAborted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::RouteDecision => "route_decision",
            EventKind::ToolCall => "tool_call",
            EventKind::ToolResult => "tool_result",
            EventKind::ValidationFailed => "validation_failed",
            EventKind::TurnCompleted => "turn_completed",
            EventKind::TurnAborted => "turn_aborted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transcript record. The payload is usually a JSON object carrying
/// `conversation_id` plus kind-specific fields; the timestamp is added by
/// the writer.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    pub kind: EventKind,
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(kind: EventKind, payload: Value) -> Self {
        Self { kind, payload }
    }
}

/// Sink for transcript records.
///
/// `log` never fails from the caller's point of view: a turn must not break
/// because its transcript could not be written.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Discards every record
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
