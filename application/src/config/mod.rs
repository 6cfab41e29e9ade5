//! Application-level configuration.
//!
//! - [`OrchestratorConfig`]: history window, reply language, per-stage
//!   completion options, timeouts and the bulk-operation policy

pub mod orchestrator_config;

pub use orchestrator_config::{OrchestratorConfig, StageOptions};
