//! Ollama adapter for the completion backend port.

mod backend;
mod stream;
mod types;

pub use backend::{DEFAULT_HOST, DEFAULT_MODEL, OllamaBackend, OllamaSettings};
pub use types::SamplingSettings;
