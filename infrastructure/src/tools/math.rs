//! Arithmetic tools: `add`, `subtract`, `multiply`.

use async_trait::async_trait;
use parley_domain::{
    ArgumentType, ProviderError, ToolDefinition, ToolError, ToolParameter, ToolProvider, ToolSpec,
    ValidatedArguments,
};

pub const ADD: &str = "add";
pub const SUBTRACT: &str = "subtract";
pub const MULTIPLY: &str = "multiply";

pub struct MathProvider;

fn operands(name: &str, description: &str, arg_type: ArgumentType) -> ToolDefinition {
    ToolDefinition::new(name, description)
        .with_parameter(ToolParameter::new("a", "First number", true).with_type(arg_type.clone()))
        .with_parameter(ToolParameter::new("b", "Second number", true).with_type(arg_type))
}

/// Integral results print without a fractional part (`8`, not `8.0`).
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn add(args: &ValidatedArguments) -> Result<String, ToolError> {
    Ok(format_number(args.require_f64("a")? + args.require_f64("b")?))
}

fn subtract(args: &ValidatedArguments) -> Result<String, ToolError> {
    Ok(format_number(args.require_f64("a")? - args.require_f64("b")?))
}

fn multiply(args: &ValidatedArguments) -> Result<String, ToolError> {
    let a = args.require_i64("a")?;
    let b = args.require_i64("b")?;
    a.checked_mul(b)
        .map(|product| product.to_string())
        .ok_or_else(|| ToolError::execution_failed(format!("{} * {} overflows", a, b)))
}

impl MathProvider {
    pub fn tools() -> Vec<ToolSpec> {
        vec![
            ToolSpec::from_sync_fn(
                operands(ADD, "Adds two numbers.", ArgumentType::Float),
                add,
            ),
            ToolSpec::from_sync_fn(
                operands(
                    SUBTRACT,
                    "Subtracts the second number from the first.",
                    ArgumentType::Float,
                ),
                subtract,
            ),
            ToolSpec::from_sync_fn(
                operands(
                    MULTIPLY,
                    "Multiplies two whole numbers. Use when the user asks for a product.",
                    ArgumentType::Integer,
                ),
                multiply,
            ),
        ]
    }
}

#[async_trait]
impl ToolProvider for MathProvider {
    fn id(&self) -> &str {
        "math"
    }

    fn display_name(&self) -> &str {
        "Arithmetic"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn discover_tools(&self) -> Result<Vec<ToolSpec>, ProviderError> {
        Ok(Self::tools())
    }
}
