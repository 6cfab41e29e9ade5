//! Domain layer for parley
//!
//! This crate contains the core rules of the tool-routing assistant: tool
//! definitions and their argument schemas, the tool registry, schema
//! validation, conversation history, and the text heuristics that turn raw
//! model output into routing decisions and argument maps.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! A tool is a named capability with a typed argument schema
//! ([`ToolDefinition`]) and an invoke handle ([`ToolCapability`]). Tools are
//! collected in a [`ToolRegistry`] that is built once at start-up and shared
//! read-only afterwards.
//!
//! ## Turns
//!
//! A conversation is an append-only sequence of [`Turn`]s held in a
//! [`ConversationContext`]. Prompts only ever see a trailing window of it.
//!
//! ## Routing
//!
//! [`RouterDecision`] and [`parse_raw_arguments`] are the deterministic,
//! reproducible parsers applied to completion text.

pub mod conversation;
pub mod core;
pub mod prompt;
pub mod routing;
pub mod session;
pub mod tool;

// Re-export commonly used types
pub use conversation::entities::{ConversationContext, Role, Turn, TurnError};
pub use core::string::single_line_preview;
pub use prompt::PromptTemplate;
pub use routing::{
    BulkPolicy, BulkPolicyError, DEFAULT_BULK_TOOLS, DEFAULT_ID_FIELD, DEFAULT_ID_PATTERN,
    DEFAULT_KEYWORDS, DEFAULT_LIST_TOOL, RouterDecision, parse_raw_arguments,
};
pub use session::{options::CompletionOptions, stream::StreamEvent};
pub use tool::{
    capability::{ToolCapability, ToolSpec},
    entities::{ArgumentType, ToolDefinition, ToolParameter},
    provider::{ProviderError, ToolProvider},
    registry::{DuplicatePolicy, RegistryError, ToolRegistry},
    traits::{DefaultSchemaValidator, SchemaValidator},
    value_objects::{
        ArgValue, ExecutionError, ExecutionErrorKind, ExecutionResult, RawArguments, ToolError,
        ValidatedArguments, ValidationError,
    },
};
