//! Router decision parsing

use serde::{Deserialize, Serialize};

/// Characters stripped from a router reply before matching
const QUOTING: &[char] = &['"', '\'', '`', '*'];

/// Which tool, if any, a turn should invoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "tool", rename_all = "snake_case")]
pub enum RouterDecision {
    Tool(String),
    None,
}

impl RouterDecision {
    /// Match a router reply against tool names given in registration order.
    ///
    /// The reply is lower-cased and stripped of quoting punctuation. The first
    /// name (lower-cased) that occurs as a substring wins, so registration
    /// order is the tie-break when several names match.
    pub fn from_response<'a>(response: &str, names: impl IntoIterator<Item = &'a str>) -> Self {
        let normalized: String = response
            .to_lowercase()
            .chars()
            .filter(|c| !QUOTING.contains(c))
            .collect();

        names
            .into_iter()
            .find(|name| !name.is_empty() && normalized.contains(&name.to_lowercase()))
            .map(|name| RouterDecision::Tool(name.to_string()))
            .unwrap_or(RouterDecision::None)
    }

    pub fn tool_name(&self) -> Option<&str> {
        match self {
            RouterDecision::Tool(name) => Some(name),
            RouterDecision::None => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, RouterDecision::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: &[&str] = &["add", "add_task", "list_tasks", "get_current_weather"];

    fn decide(response: &str) -> RouterDecision {
        RouterDecision::from_response(response, NAMES.iter().copied())
    }

    #[test]
    fn test_plain_name() {
        assert_eq!(
            decide("list_tasks"),
            RouterDecision::Tool("list_tasks".to_string())
        );
    }

    #[test]
    fn test_first_registered_wins() {
        // "add_task" also contains "add", which was registered first
        assert_eq!(decide("add_task"), RouterDecision::Tool("add".to_string()));
    }

    #[test]
    fn test_quoting_and_case_are_ignored() {
        assert_eq!(
            decide("Tool: **`GET_CURRENT_WEATHER`**"),
            RouterDecision::Tool("get_current_weather".to_string())
        );
        assert_eq!(
            decide("\"list_tasks\""),
            RouterDecision::Tool("list_tasks".to_string())
        );
    }

    #[test]
    fn test_no_match_is_none() {
        let decision = decide("none");
        assert!(decision.is_none());
        assert_eq!(decision.tool_name(), None);
        assert!(RouterDecision::from_response("add", std::iter::empty()).is_none());
    }
}
