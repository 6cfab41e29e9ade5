//! Logging configuration from TOML (`[logging]` section)

use super::expand_path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of conversation events; disabled when unset
    pub conversation_log: Option<String>,
    /// Directory for daily-rotated diagnostic logs; stderr only when unset
    pub log_dir: Option<String>,
    /// Default filter directive when `RUST_LOG` and `-v` are absent
    pub level: Option<String>,
}

impl FileLoggingConfig {
    pub fn conversation_log_path(&self) -> Option<PathBuf> {
        self.conversation_log.as_deref().map(expand_path)
    }

    pub fn log_dir_path(&self) -> Option<PathBuf> {
        self.log_dir.as_deref().map(expand_path)
    }
}
