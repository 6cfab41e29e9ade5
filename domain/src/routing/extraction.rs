//! Argument map extraction from completion text

use crate::tool::value_objects::RawArguments;
use serde_json::Value;

/// Parse the substring between the first `{` and the last `}` as a JSON
/// object.
///
/// Missing braces, invalid JSON, or a non-object payload all yield an empty
/// map. This never fails; the schema validator reports whatever is missing.
pub fn parse_raw_arguments(text: &str) -> RawArguments {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return RawArguments::new();
    };
    if end < start {
        return RawArguments::new();
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        _ => RawArguments::new(),
    }
}
