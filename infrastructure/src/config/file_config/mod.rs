//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every section uses `#[serde(default)]`, so any subset of keys is valid.
//! Values that deserialize but cannot be used are reported as
//! [`ConfigIssue`]s and replaced by a safe fallback.

mod backend;
mod conversation;
mod generation;
mod logging;
mod repl;
mod tools;

pub use backend::FileBackendConfig;
pub use conversation::{FileConversationConfig, StoreKind};
pub use generation::{FileGenerationConfig, FileStageOptions};
pub use logging::FileLoggingConfig;
pub use repl::FileReplConfig;
pub use tools::{
    FileBulkConfig, FileDateTimeConfig, FileTasksConfig, FileToolsConfig, FileWeatherConfig,
    KNOWN_PROVIDERS,
};

use crate::config::issues::ConfigIssue;
use parley_application::OrchestratorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Expand a leading `~/` to the home directory
pub(crate) fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Completion backend (Ollama) settings
    pub backend: FileBackendConfig,
    /// History window, language, preamble and store
    pub conversation: FileConversationConfig,
    /// Per-stage sampling overrides
    pub generation: FileGenerationConfig,
    /// Tool providers, bulk shortcut and per-tool settings
    pub tools: FileToolsConfig,
    /// Conversation transcript and diagnostic log files
    pub logging: FileLoggingConfig,
    /// REPL settings
    pub repl: FileReplConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. It checks:
    /// 1. Empty backend host or model
    /// 2. History window of zero
    /// 3. Unknown enum-like strings (store kind, providers, weather units)
    /// 4. The bulk id pattern
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.backend.to_ollama_settings().1);
        issues.extend(self.conversation.parse_history_window().1);
        issues.extend(self.conversation.parse_store().1);
        issues.extend(self.tools.unknown_provider_issues());
        issues.extend(self.tools.weather.to_settings().1);
        issues.extend(self.tools.bulk.to_policy().1);

        issues
    }

    /// Build the orchestrator settings, applying the same fallbacks that
    /// [`validate`](Self::validate) reports.
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        let mut config = OrchestratorConfig::default()
            .with_history_window(self.conversation.parse_history_window().0)
            .with_language(self.conversation.language.clone())
            .with_options(self.generation.to_stage_options())
            .with_request_timeout(self.backend.request_timeout())
            .with_stream_idle_timeout(self.backend.stream_idle_timeout())
            .with_bulk_policy(self.tools.bulk.to_policy().0);
        if let Some(preamble) = &self.conversation.preamble {
            config = config.with_preamble(preamble.clone());
        }
        config
    }
}
