//! Interactive chat module
//!
//! Provides a line-editor chat interface over the orchestrator.

mod repl;

pub use repl::ChatRepl;
