//! Tool domain value objects: argument maps, typed values and error types
//!
//! These types form the data flowing through a tool turn:
//!
//! ```text
//! RawArguments ──(SchemaValidator)──▶ ValidatedArguments ──(capability)──▶ ExecutionResult
//!                       │                                        │
//!                       └─ ValidationError                       └─ ToolError → ExecutionError
//! ```

use super::entities::ArgumentType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Untyped arguments as extracted from model output. Possibly empty and
/// possibly malformed relative to the tool's schema.
pub type RawArguments = HashMap<String, serde_json::Value>;

/// Outcome of running a tool: the raw (or finalized) text, or a failure that
/// has already been isolated from the caller.
pub type ExecutionResult = Result<String, ExecutionError>;

/// A coerced, typed argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    List(Vec<ArgValue>),
}

impl ArgValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Integers widen to floats so numeric tools can accept either.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Float(n) => Some(*n),
            ArgValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            ArgValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Integer(n) => write!(f, "{}", n),
            ArgValue::Float(n) => write!(f, "{}", n),
            ArgValue::Boolean(b) => write!(f, "{}", b),
            ArgValue::String(s) => write!(f, "{}", s),
            ArgValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// Arguments that passed the schema validator for a specific tool.
///
/// Holds exactly the schema's fields that were supplied (absent optional
/// fields are omitted), in schema order. Only these may reach a capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidatedArguments {
    values: Vec<(String, ArgValue)>,
}

impl ValidatedArguments {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value (builder pattern). Used by the validator and by callers
    /// that invoke a tool directly, such as the bulk list-tool lookup.
    pub fn with(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.values.push((name.into(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ArgValue::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ArgValue::as_f64)
    }

    /// Get a required string argument or an `INVALID_ARGUMENT` tool error
    pub fn require_str(&self, name: &str) -> Result<&str, ToolError> {
        self.get_str(name)
            .ok_or_else(|| ToolError::invalid_argument(format!("Missing argument: {}", name)))
    }

    pub fn require_f64(&self, name: &str) -> Result<f64, ToolError> {
        self.get_f64(name)
            .ok_or_else(|| ToolError::invalid_argument(format!("Missing argument: {}", name)))
    }

    pub fn require_i64(&self, name: &str) -> Result<i64, ToolError> {
        self.get_i64(name)
            .ok_or_else(|| ToolError::invalid_argument(format!("Missing argument: {}", name)))
    }

    /// Get a required list of integers (e.g. task ids)
    pub fn require_i64_list(&self, name: &str) -> Result<Vec<i64>, ToolError> {
        let items = self
            .get(name)
            .and_then(ArgValue::as_list)
            .ok_or_else(|| ToolError::invalid_argument(format!("Missing argument: {}", name)))?;
        items
            .iter()
            .map(|v| {
                v.as_i64().ok_or_else(|| {
                    ToolError::invalid_argument(format!("Non-integer value in {}: {}", name, v))
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Field-level schema violation. Produced only by the schema validator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required argument '{field}' for tool '{tool}'")]
    Missing { tool: String, field: String },

    #[error("Argument '{field}' for tool '{tool}' must be {expected}, got {found}")]
    TypeMismatch {
        tool: String,
        field: String,
        expected: ArgumentType,
        found: String,
    },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Missing { field, .. } | ValidationError::TypeMismatch { field, .. } => {
                field
            }
        }
    }
}

/// Error raised by a tool capability itself.
///
/// Capabilities define their own failures with a code and a message; the
/// executor folds them into an [`ExecutionError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code (e.g., "NOT_FOUND", "UNAVAILABLE")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", format!("Not found: {}", resource.into()))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new("EXECUTION_FAILED", message)
    }

    /// The capability depends on something that is not configured or reachable
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new("UNAVAILABLE", message)
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ToolError {}

/// Category of an isolated execution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    /// The capability returned an error
    ToolFailed,
    /// The capability panicked
    Panicked,
    /// The capability succeeded but the finalize generation failed
    FinalizeFailed,
    /// The router chose a name the registry does not know
    ToolNotFound,
}

impl ExecutionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionErrorKind::ToolFailed => "tool_failed",
            ExecutionErrorKind::Panicked => "panicked",
            ExecutionErrorKind::FinalizeFailed => "finalize_failed",
            ExecutionErrorKind::ToolNotFound => "tool_not_found",
        }
    }
}

/// A tool failure after it has been caught at the executor boundary.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Tool '{tool_name}' failed ({}): {message}", kind.as_str())]
pub struct ExecutionError {
    pub tool_name: String,
    pub kind: ExecutionErrorKind,
    pub message: String,
}

impl ExecutionError {
    pub fn new(
        tool_name: impl Into<String>,
        kind: ExecutionErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            kind,
            message: message.into(),
        }
    }
}
