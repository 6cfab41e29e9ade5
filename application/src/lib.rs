//! Application layer for parley
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{OrchestratorConfig, StageOptions};
pub use ports::{
    completion_backend::{CompletionBackend, GatewayError, StreamHandle},
    conversation_logger::{
        ConversationEvent, ConversationLogger, EventKind, NoConversationLogger,
    },
    conversation_store::{ConversationStore, NoConversationStore, StoreError},
    turn_progress::{NoTurnProgress, TurnProgressNotifier, TurnStage},
};
pub use use_cases::execute_tool::{ToolExecutor, invoke_isolated};
pub use use_cases::extract_arguments::{ArgumentExtractor, ExtractionSource};
pub use use_cases::fallback::FallbackGenerator;
pub use use_cases::orchestrator::{Orchestrator, OrchestratorError, TurnStream};
pub use use_cases::route_turn::Router;
