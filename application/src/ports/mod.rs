//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod completion_backend;
pub mod conversation_logger;
pub mod conversation_store;
pub mod turn_progress;
