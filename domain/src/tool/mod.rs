//! Tool domain module
//!
//! This module defines how the assistant describes, collects and validates
//! the typed capabilities it can call on the user's behalf.
//!
//! # Overview
//!
//! ```text
//! ┌────────────────┐   ┌──────────────┐   ┌──────────────────┐   ┌─────────────────┐
//! │ ToolDefinition │──▶│ RawArguments │──▶│ SchemaValidator  │──▶│ ValidatedArgs   │
//! │ (schema)       │   │ (from model) │   │ (coercion gate)  │   │ → ToolCapability│
//! └────────────────┘   └──────────────┘   └──────────────────┘   └─────────────────┘
//! ```
//!
//! - [`ToolSpec`] pairs a [`ToolDefinition`] with its [`ToolCapability`].
//!   Closures and objects are both accepted through constructors, so the
//!   engine never branches on tool shape.
//! - [`ToolRegistry`](registry::ToolRegistry) keeps specs in registration
//!   order, keyed case-insensitively by name.
//! - [`SchemaValidator`] is the single place structural argument errors are
//!   detected.
//! - [`ToolProvider`] is the registration-function pattern used to assemble
//!   the registry at start-up.
//!
//! # Architecture
//!
//! - **Domain** (this module): pure definitions and validation, no I/O
//! - **Application**: tool execution with failure isolation and finalize step
//! - **Infrastructure**: concrete tools (math, tasks, datetime, weather) and
//!   provider discovery

pub mod capability;
pub mod entities;
pub mod provider;
pub mod registry;
pub mod traits;
pub mod value_objects;

pub use capability::{ToolCapability, ToolSpec};
pub use entities::{ArgumentType, ToolDefinition, ToolParameter};
pub use provider::{ProviderError, ToolProvider};
pub use registry::{DuplicatePolicy, RegistryError, ToolRegistry};
pub use traits::{DefaultSchemaValidator, SchemaValidator};
pub use value_objects::{ToolError, ValidatedArguments, ValidationError};
