//! REPL configuration from TOML (`[repl]` section)

use super::expand_path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw REPL configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Show a spinner while a turn is routed and tools run
    pub show_progress: bool,
    /// Print replies fragment by fragment
    pub stream: bool,
    /// Conversation id used when none is given on the command line
    pub conversation_id: String,
    /// Path to history file
    pub history_file: Option<String>,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            stream: true,
            conversation_id: "default".to_string(),
            history_file: None,
        }
    }
}

impl FileReplConfig {
    /// Line-editor history file, defaulting to the data directory
    pub fn history_path(&self) -> Option<PathBuf> {
        match &self.history_file {
            Some(path) => Some(expand_path(path)),
            None => dirs::data_dir().map(|d| d.join("parley").join("history.txt")),
        }
    }
}
