//! Tool domain entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a tool argument.
///
/// Only primitives and lists of primitives are supported; nested lists are
/// representable but no built-in tool declares one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    Integer,
    Float,
    String,
    Boolean,
    List(Box<ArgumentType>),
}

impl ArgumentType {
    pub fn list_of(inner: ArgumentType) -> Self {
        ArgumentType::List(Box::new(inner))
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentType::Integer => write!(f, "integer"),
            ArgumentType::Float => write!(f, "float"),
            ArgumentType::String => write!(f, "string"),
            ArgumentType::Boolean => write!(f, "boolean"),
            ArgumentType::List(inner) => write!(f, "list<{}>", inner),
        }
    }
}

/// Parameter specification for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter description, shown to the model during extraction
    pub description: String,
    /// Whether this parameter is required
    pub required: bool,
    /// Declared type used for coercion
    pub arg_type: ArgumentType,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            arg_type: ArgumentType::String,
        }
    }

    pub fn with_type(mut self, arg_type: ArgumentType) -> Self {
        self.arg_type = arg_type;
        self
    }
}

/// Definition of a tool: its name, description and ordered argument schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "add_task"), matched case-insensitively
    pub name: String,
    /// Human-readable description, used verbatim in router and extractor prompts
    pub description: String,
    /// Parameter specifications, in declaration order
    pub parameters: Vec<ToolParameter>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }
}
