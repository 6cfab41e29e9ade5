//! Conversation configuration from TOML (`[conversation]` section)

use super::expand_path;
use crate::config::issues::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where conversation history is kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Jsonl { dir: PathBuf },
}

/// Raw conversation configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConversationConfig {
    /// Number of trailing turns included in prompts
    pub history_window: usize,
    /// Language tool results are phrased in
    pub language: String,
    /// Preamble for conversational replies; built-in text when unset
    pub preamble: Option<String>,
    /// "memory" or "jsonl"
    pub store: String,
    /// Directory for the "jsonl" store
    pub store_dir: Option<String>,
}

impl Default for FileConversationConfig {
    fn default() -> Self {
        Self {
            history_window: 5,
            language: "English".to_string(),
            preamble: None,
            store: "memory".to_string(),
            store_dir: None,
        }
    }
}

impl FileConversationConfig {
    /// Default directory for the "jsonl" store
    pub fn default_store_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("parley").join("conversations"))
    }

    pub fn parse_store(&self) -> (StoreKind, Vec<ConfigIssue>) {
        match self.store.trim().to_lowercase().as_str() {
            "memory" => (StoreKind::Memory, Vec::new()),
            "jsonl" => {
                let dir = self
                    .store_dir
                    .as_deref()
                    .map(expand_path)
                    .or_else(Self::default_store_dir);
                match dir {
                    Some(dir) => (StoreKind::Jsonl { dir }, Vec::new()),
                    None => (
                        StoreKind::Memory,
                        vec![ConfigIssue::error(
                            ConfigIssueCode::EmptyValue {
                                field: "conversation.store_dir".to_string(),
                            },
                            "conversation.store_dir is not set and no data directory is known; \
                             keeping history in memory",
                        )],
                    ),
                }
            }
            _ => (
                StoreKind::Memory,
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "conversation.store".to_string(),
                        value: self.store.clone(),
                        valid_values: vec!["memory".to_string(), "jsonl".to_string()],
                    },
                    format!(
                        "conversation.store: unknown value '{}', falling back to 'memory'",
                        self.store
                    ),
                )],
            ),
        }
    }

    /// History window; `0` would hide the utterance itself from every
    /// prompt, so it is raised to 1.
    pub fn parse_history_window(&self) -> (usize, Vec<ConfigIssue>) {
        if self.history_window == 0 {
            return (
                1,
                vec![ConfigIssue::error(
                    ConfigIssueCode::OutOfRange {
                        field: "conversation.history_window".to_string(),
                        value: "0".to_string(),
                    },
                    "conversation.history_window must be at least 1, using 1",
                )],
            );
        }
        (self.history_window, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_store() {
        let config = FileConversationConfig {
            store: "JSONL".to_string(),
            store_dir: Some("/tmp/parley-conv".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.parse_store().0,
            StoreKind::Jsonl {
                dir: PathBuf::from("/tmp/parley-conv")
            }
        );

        let config = FileConversationConfig {
            store: "sqlite".to_string(),
            ..Default::default()
        };
        let (kind, issues) = config.parse_store();
        assert_eq!(kind, StoreKind::Memory);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn test_zero_window_is_raised() {
        let config = FileConversationConfig {
            history_window: 0,
            ..Default::default()
        };
        let (window, issues) = config.parse_history_window();
        assert_eq!(window, 1);
        assert!(issues[0].is_error());
    }
}
