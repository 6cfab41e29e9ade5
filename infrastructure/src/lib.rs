//! Infrastructure layer for parley
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the Ollama completion backend, the built-in tools and
//! their providers, conversation stores, the JSONL conversation logger, and
//! configuration file loading.

pub mod config;
pub mod logging;
pub mod ollama;
pub mod store;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigIssue, ConfigLoader, FileConfig, FileReplConfig, Severity, StoreKind,
};
pub use logging::JsonlConversationLogger;
pub use ollama::{OllamaBackend, OllamaSettings};
pub use store::{InMemoryConversationStore, JsonlConversationStore};
pub use tools::{
    DateTimeProvider, MathProvider, TaskBook, TaskProvider, ToolDiscovery, WeatherProvider,
};
