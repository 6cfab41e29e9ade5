//! Use cases
//!
//! Application-level operations that orchestrate domain logic. Each stage
//! of a turn is its own use case; [`orchestrator::Orchestrator`] composes
//! them.

pub mod execute_tool;
pub mod extract_arguments;
pub mod fallback;
pub mod orchestrator;
pub mod route_turn;
pub(crate) mod shared;

#[cfg(test)]
pub(crate) mod test_support;
