//! Orchestrator configuration: per-turn behaviour.
//!
//! [`OrchestratorConfig`] groups the static parameters that control how a
//! turn is routed, extracted, finalized and generated. It is built by the
//! infrastructure config loader and handed to
//! [`Orchestrator`](crate::use_cases::orchestrator::Orchestrator) at
//! construction.

use parley_domain::{BulkPolicy, CompletionOptions};
use std::time::Duration;

const DEFAULT_PREAMBLE: &str = "You are a helpful, concise assistant. \
Answer the user's latest message using the conversation so far.";

/// Completion options for each backend call a turn can make.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOptions {
    pub router: CompletionOptions,
    pub extraction: CompletionOptions,
    pub finalize: CompletionOptions,
    pub fallback: CompletionOptions,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            router: CompletionOptions::deterministic().with_max_tokens(32),
            extraction: CompletionOptions::deterministic(),
            finalize: CompletionOptions::new().with_temperature(0.3),
            fallback: CompletionOptions::new().with_temperature(0.7),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Number of trailing turns shown in prompts.
    pub history_window: usize,
    /// Language the finalize step replies in.
    pub language: String,
    /// System preamble for conversational fallback.
    pub preamble: String,
    pub options: StageOptions,
    /// Timeout for each non-streaming backend call.
    pub request_timeout: Option<Duration>,
    /// Maximum silence between two stream fragments.
    pub stream_idle_timeout: Option<Duration>,
    pub bulk: BulkPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_window: 5,
            language: "English".to_string(),
            preamble: DEFAULT_PREAMBLE.to_string(),
            options: StageOptions::default(),
            request_timeout: Some(Duration::from_secs(120)),
            stream_idle_timeout: Some(Duration::from_secs(60)),
            bulk: BulkPolicy::default(),
        }
    }
}

impl OrchestratorConfig {
    // ==================== Builder Methods ====================

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    pub fn with_options(mut self, options: StageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_stream_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stream_idle_timeout = timeout;
        self
    }

    pub fn with_bulk_policy(mut self, bulk: BulkPolicy) -> Self {
        self.bulk = bulk;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.history_window, 5);
        assert_eq!(config.language, "English");
        assert_eq!(config.options.router.temperature, Some(0.0));
        assert!(config.request_timeout.is_some());
        assert!(config.bulk.is_enabled());
    }

    #[test]
    fn test_builders() {
        let config = OrchestratorConfig::default()
            .with_history_window(3)
            .with_language("Polish")
            .with_request_timeout(None)
            .with_bulk_policy(BulkPolicy::disabled());
        assert_eq!(config.history_window, 3);
        assert_eq!(config.language, "Polish");
        assert!(config.request_timeout.is_none());
        assert!(!config.bulk.is_enabled());
    }
}
