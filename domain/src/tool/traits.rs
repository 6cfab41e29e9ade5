//! Tool domain traits
//!
//! Contains the pure schema validation gate. Structural argument errors are
//! detected here and nowhere else.

use super::entities::{ArgumentType, ToolDefinition};
use super::value_objects::{ArgValue, RawArguments, ValidatedArguments, ValidationError};
use crate::core::string::single_line_preview;
use serde_json::Value;

/// Validator for extracted tool arguments
///
/// This is a pure domain trait that checks and coerces raw arguments
/// against a tool's schema without any I/O operations.
pub trait SchemaValidator: Send + Sync {
    fn validate(
        &self,
        definition: &ToolDefinition,
        raw: &RawArguments,
    ) -> Result<ValidatedArguments, ValidationError>;
}

/// Default implementation of SchemaValidator
///
/// Walks the declared fields in order. A JSON `null` counts as absent.
/// Unknown keys in the raw map are ignored.
#[derive(Debug, Clone, Default)]
pub struct DefaultSchemaValidator;

impl SchemaValidator for DefaultSchemaValidator {
    fn validate(
        &self,
        definition: &ToolDefinition,
        raw: &RawArguments,
    ) -> Result<ValidatedArguments, ValidationError> {
        let mut validated = ValidatedArguments::new();

        for param in &definition.parameters {
            let value = match raw.get(&param.name) {
                Some(Value::Null) | None => {
                    if param.required {
                        return Err(ValidationError::Missing {
                            tool: definition.name.clone(),
                            field: param.name.clone(),
                        });
                    }
                    continue;
                }
                Some(value) => value,
            };

            let coerced =
                coerce(value, &param.arg_type).ok_or_else(|| ValidationError::TypeMismatch {
                    tool: definition.name.clone(),
                    field: param.name.clone(),
                    expected: param.arg_type.clone(),
                    found: single_line_preview(&value.to_string(), 40),
                })?;
            validated = validated.with(param.name.clone(), coerced);
        }

        Ok(validated)
    }
}

fn coerce(value: &Value, expected: &ArgumentType) -> Option<ArgValue> {
    match expected {
        ArgumentType::Integer => coerce_integer(value).map(ArgValue::Integer),
        ArgumentType::Float => coerce_float(value).map(ArgValue::Float),
        ArgumentType::String => match value {
            Value::String(s) => Some(ArgValue::String(s.clone())),
            Value::Number(n) => Some(ArgValue::String(n.to_string())),
            Value::Bool(b) => Some(ArgValue::String(b.to_string())),
            _ => None,
        },
        ArgumentType::Boolean => match value {
            Value::Bool(b) => Some(ArgValue::Boolean(*b)),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => {
                Some(ArgValue::Boolean(true))
            }
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => {
                Some(ArgValue::Boolean(false))
            }
            _ => None,
        },
        ArgumentType::List(inner) => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce(item, inner))
                .collect::<Option<Vec<_>>>()
                .map(ArgValue::List),
            Value::Object(_) | Value::Null => None,
            scalar => coerce(scalar, inner).map(|v| ArgValue::List(vec![v])),
        },
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::ToolParameter;
    use serde_json::json;

    fn raw(value: Value) -> RawArguments {
        serde_json::from_value(value).unwrap()
    }

    fn add_tool() -> ToolDefinition {
        ToolDefinition::new("add", "Adds two numbers")
            .with_parameter(ToolParameter::new("a", "First", true).with_type(ArgumentType::Integer))
            .with_parameter(ToolParameter::new("b", "Second", true).with_type(ArgumentType::Integer))
    }

    #[test]
    fn test_missing_required_field() {
        let def = ToolDefinition::new("add_task", "Adds a task")
            .with_parameter(ToolParameter::new("description", "Task text", true));

        let err = DefaultSchemaValidator
            .validate(&def, &RawArguments::new())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Missing {
                tool: "add_task".to_string(),
                field: "description".to_string(),
            }
        );
    }

    #[test]
    fn test_null_counts_as_absent() {
        let def = ToolDefinition::new("add_task", "Adds a task")
            .with_parameter(ToolParameter::new("description", "Task text", true));

        let err = DefaultSchemaValidator
            .validate(&def, &raw(json!({"description": null})))
            .unwrap_err();
        assert_eq!(err.field(), "description");
    }

    #[test]
    fn test_integer_coercions() {
        let validated = DefaultSchemaValidator
            .validate(&add_tool(), &raw(json!({"a": "5", "b": 3.0})))
            .unwrap();
        assert_eq!(validated.get_i64("a"), Some(5));
        assert_eq!(validated.get_i64("b"), Some(3));
    }

    #[test]
    fn test_non_integral_float_is_mismatch() {
        let err = DefaultSchemaValidator
            .validate(&add_tool(), &raw(json!({"a": 2.5, "b": 1})))
            .unwrap_err();
        match err {
            ValidationError::TypeMismatch {
                field, expected, ..
            } => {
                assert_eq!(field, "a");
                assert_eq!(expected, ArgumentType::Integer);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_string_and_boolean_coercions() {
        let def = ToolDefinition::new("t", "test")
            .with_parameter(ToolParameter::new("city", "City", true))
            .with_parameter(
                ToolParameter::new("metric", "Units", true).with_type(ArgumentType::Boolean),
            );

        let validated = DefaultSchemaValidator
            .validate(&def, &raw(json!({"city": 42, "metric": "TRUE"})))
            .unwrap();
        assert_eq!(validated.get_str("city"), Some("42"));
        assert_eq!(validated.get("metric"), Some(&ArgValue::Boolean(true)));

        let err = DefaultSchemaValidator
            .validate(&def, &raw(json!({"city": "Gdańsk", "metric": "yes"})))
            .unwrap_err();
        assert_eq!(err.field(), "metric");
    }

    #[test]
    fn test_list_coercions() {
        let def = ToolDefinition::new("complete_task", "Completes tasks").with_parameter(
            ToolParameter::new("task_ids", "Ids", true)
                .with_type(ArgumentType::list_of(ArgumentType::Integer)),
        );

        let validated = DefaultSchemaValidator
            .validate(&def, &raw(json!({"task_ids": [1, "2", 3.0]})))
            .unwrap();
        assert_eq!(validated.require_i64_list("task_ids").unwrap(), vec![1, 2, 3]);

        // A single scalar is wrapped
        let validated = DefaultSchemaValidator
            .validate(&def, &raw(json!({"task_ids": 7})))
            .unwrap();
        assert_eq!(validated.require_i64_list("task_ids").unwrap(), vec![7]);

        let err = DefaultSchemaValidator
            .validate(&def, &raw(json!({"task_ids": [1, "x"]})))
            .unwrap_err();
        assert_eq!(err.field(), "task_ids");
    }

    #[test]
    fn test_unknown_keys_ignored_and_schema_order_kept() {
        let def = ToolDefinition::new("t", "test")
            .with_parameter(ToolParameter::new("first", "1", true))
            .with_parameter(ToolParameter::new("optional", "2", false))
            .with_parameter(ToolParameter::new("last", "3", true));

        let validated = DefaultSchemaValidator
            .validate(&def, &raw(json!({"last": "z", "extra": 1, "first": "a"})))
            .unwrap();

        let keys: Vec<&str> = validated.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["first", "last"]);
    }

    #[test]
    fn test_float_from_string() {
        let def = ToolDefinition::new("add", "Adds")
            .with_parameter(ToolParameter::new("a", "a", true).with_type(ArgumentType::Float));

        let validated = DefaultSchemaValidator
            .validate(&def, &raw(json!({"a": " 2.5 "})))
            .unwrap();
        assert_eq!(validated.get_f64("a"), Some(2.5));

        assert!(
            DefaultSchemaValidator
                .validate(&def, &raw(json!({"a": true})))
                .is_err()
        );
    }
}
