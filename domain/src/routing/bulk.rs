//! Bulk-operation shortcut
//!
//! When the user asks to act on "all" items of a bulk-capable tool (e.g.
//! "usuń wszystkie zadania"), the ids are collected from the list tool's
//! output instead of asking the model to extract them.

use regex::Regex;
use thiserror::Error;

/// Default pattern for ids in list output, e.g. `- [ID: 3] buy milk`
pub const DEFAULT_ID_PATTERN: &str = r"\[ID:\s*(\d+)\]";

pub const DEFAULT_KEYWORDS: &[&str] = &["wszystkie", "wszystko", "wszystkich", "all", "every", "everything"];
pub const DEFAULT_BULK_TOOLS: &[&str] = &["complete_task", "delete_task"];
pub const DEFAULT_LIST_TOOL: &str = "list_tasks";
pub const DEFAULT_ID_FIELD: &str = "task_ids";

/// Why a bulk policy could not be built
#[derive(Debug, Error)]
pub enum BulkPolicyError {
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// The id pattern must capture the id in group 1
    #[error("pattern '{0}' has no capture group for the id")]
    MissingCaptureGroup(String),
}

#[derive(Debug, Clone)]
pub struct BulkPolicy {
    keywords: Vec<String>,
    /// Whole-word, case-insensitive alternation of `keywords`
    keyword_regex: Option<Regex>,
    bulk_tools: Vec<String>,
    list_tool: String,
    id_field: String,
    id_regex: Option<Regex>,
}

impl BulkPolicy {
    /// Build a policy. Fails if `id_pattern` is not a valid regex or has no
    /// capture group to read the id from.
    pub fn new(
        keywords: Vec<String>,
        bulk_tools: Vec<String>,
        list_tool: impl Into<String>,
        id_field: impl Into<String>,
        id_pattern: &str,
    ) -> Result<Self, BulkPolicyError> {
        let id_regex = Regex::new(id_pattern)?;
        if id_regex.captures_len() < 2 {
            return Err(BulkPolicyError::MissingCaptureGroup(id_pattern.to_string()));
        }
        let keyword_regex = keyword_matcher(&keywords)?;
        Ok(Self {
            keywords,
            keyword_regex,
            bulk_tools,
            list_tool: list_tool.into(),
            id_field: id_field.into(),
            id_regex: Some(id_regex),
        })
    }

    /// A policy that never applies; every tool goes through LLM extraction
    pub fn disabled() -> Self {
        Self {
            keywords: Vec::new(),
            keyword_regex: None,
            bulk_tools: Vec::new(),
            list_tool: String::new(),
            id_field: String::new(),
            id_regex: None,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn list_tool(&self) -> &str {
        &self.list_tool
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn is_enabled(&self) -> bool {
        self.keyword_regex.is_some()
            && self.id_regex.is_some()
            && !self.bulk_tools.is_empty()
            && !self.list_tool.is_empty()
    }

    /// Whether `tool_name` is in the bulk-capable set (case-insensitive)
    pub fn applies_to(&self, tool_name: &str) -> bool {
        self.bulk_tools
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tool_name))
    }

    /// Whether the utterance contains any "all" keyword as a whole word
    pub fn mentions_all(&self, utterance: &str) -> bool {
        self.keyword_regex
            .as_ref()
            .is_some_and(|re| re.is_match(utterance))
    }

    /// Both conditions for the shortcut
    pub fn triggers(&self, tool_name: &str, utterance: &str) -> bool {
        self.is_enabled() && self.applies_to(tool_name) && self.mentions_all(utterance)
    }

    /// Every id captured by the id pattern, in order of appearance
    pub fn extract_ids(&self, list_output: &str) -> Vec<i64> {
        let Some(re) = &self.id_regex else {
            return Vec::new();
        };
        re.captures_iter(list_output)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| m.as_str().parse::<i64>().ok())
            .collect()
    }
}

impl Default for BulkPolicy {
    fn default() -> Self {
        let keywords: Vec<String> = DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect();
        Self {
            keyword_regex: keyword_matcher(&keywords).ok().flatten(),
            keywords,
            bulk_tools: DEFAULT_BULK_TOOLS.iter().map(|s| s.to_string()).collect(),
            list_tool: DEFAULT_LIST_TOOL.to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            id_regex: Regex::new(DEFAULT_ID_PATTERN).ok(),
        }
    }
}

fn keyword_matcher(keywords: &[String]) -> Result<Option<Regex>, regex::Error> {
    let alternation: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();
    if alternation.is_empty() {
        return Ok(None);
    }
    Regex::new(&format!(r"(?iu)\b(?:{})\b", alternation.join("|"))).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_triggers() {
        let policy = BulkPolicy::default();
        assert!(policy.is_enabled());
        assert!(policy.triggers("delete_task", "Usuń wszystkie zadania"));
        assert!(policy.triggers("COMPLETE_TASK", "mark ALL tasks as done"));
        assert!(!policy.triggers("add_task", "add all of these"));
        assert!(!policy.triggers("delete_task", "usuń zadanie 3"));
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        let policy = BulkPolicy::default();
        assert!(!policy.mentions_all("install the package"));
        assert!(!policy.mentions_all("a small ball"));
        assert!(policy.mentions_all("Wszystkich!"));
    }

    #[test]
    fn test_extract_ids() {
        let policy = BulkPolicy::default();
        let output = "Zadania:\n- [ID: 1] kupić mleko\n- [ID:4] zadzwonić\n- [ID: 12] wysłać raport";
        assert_eq!(policy.extract_ids(output), vec![1, 4, 12]);
        assert!(policy.extract_ids("Brak zadań.").is_empty());
    }

    #[test]
    fn test_custom_policy() {
        let policy = BulkPolicy::new(
            vec!["każdy".to_string(), "a.b".to_string()],
            vec!["archive".to_string()],
            "list_notes",
            "note_ids",
            r"#(\d+)",
        )
        .unwrap();

        assert!(policy.triggers("archive", "zarchiwizuj KAŻDY wpis"));
        // Keywords are literal, not patterns
        assert!(!policy.mentions_all("axb"));
        assert_eq!(policy.extract_ids("#3 first, #9 second"), vec![3, 9]);
        assert_eq!(policy.list_tool(), "list_notes");
        assert_eq!(policy.id_field(), "note_ids");
    }

    #[test]
    fn test_invalid_id_pattern_is_rejected() {
        let err = BulkPolicy::new(vec![], vec![], "l", "ids", r"[ID: (\d+").unwrap_err();
        assert!(matches!(err, BulkPolicyError::InvalidRegex(_)));
    }

    #[test]
    fn test_id_pattern_without_group_is_rejected() {
        let err = BulkPolicy::new(vec![], vec![], "l", "ids", r"\d+").unwrap_err();
        assert!(matches!(err, BulkPolicyError::MissingCaptureGroup(ref p) if p == r"\d+"));

        // A non-capturing group does not count
        assert!(BulkPolicy::new(vec![], vec![], "l", "ids", r"ID:(?:\d+)").is_err());
    }

    #[test]
    fn test_disabled_policy_never_triggers() {
        let policy = BulkPolicy::disabled();
        assert!(!policy.is_enabled());
        assert!(!policy.triggers("delete_task", "delete all"));
    }
}
