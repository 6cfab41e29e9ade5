//! Argument extractor use case.
//!
//! Turns the conversation into a [`RawArguments`] map for the chosen tool.
//! Two paths:
//!
//! 1. **Bulk shortcut**: the tool is bulk-capable and the user said "all":
//!    the list tool is run and every id in its output is collected. No
//!    backend call is made.
//! 2. **Model extraction**: one completion, parsed by the bracket-scanning
//!    JSON heuristic.
//!
//! Neither path fails: problems degrade to an empty map and the schema
//! validator reports what is missing.

use crate::ports::completion_backend::CompletionBackend;
use crate::use_cases::execute_tool::invoke_isolated;
use crate::use_cases::shared::complete_with_timeout;
use parley_domain::{
    BulkPolicy, CompletionOptions, ConversationContext, PromptTemplate, RawArguments, ToolRegistry,
    ToolSpec, Turn, ValidatedArguments, parse_raw_arguments, single_line_preview,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Where an argument map came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Bulk,
    Model,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionSource::Bulk => "bulk",
            ExtractionSource::Model => "model",
        }
    }
}

pub struct ArgumentExtractor {
    backend: Arc<dyn CompletionBackend>,
    registry: Arc<ToolRegistry>,
    bulk: BulkPolicy,
    options: CompletionOptions,
    timeout: Option<Duration>,
}

impl ArgumentExtractor {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        registry: Arc<ToolRegistry>,
        bulk: BulkPolicy,
        options: CompletionOptions,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            backend,
            registry,
            bulk,
            options,
            timeout,
        }
    }

    /// Extract arguments for `spec` from the trailing `window`, whose last
    /// user turn is the utterance being answered.
    pub async fn extract(&self, spec: &ToolSpec, window: &[Turn]) -> (RawArguments, ExtractionSource) {
        let utterance = window
            .iter()
            .rev()
            .find(|t| t.role == parley_domain::Role::User)
            .map(|t| t.content.as_str())
            .unwrap_or_default();

        if self.bulk.triggers(spec.name(), utterance)
            && let Some(raw) = self.extract_bulk().await
        {
            return (raw, ExtractionSource::Bulk);
        }

        (self.extract_with_model(spec, window).await, ExtractionSource::Model)
    }

    /// Run the list tool and collect every id. `None` means the shortcut
    /// could not be used and model extraction should run instead.
    async fn extract_bulk(&self) -> Option<RawArguments> {
        let list_tool = match self.registry.get(self.bulk.list_tool()) {
            Ok(spec) => spec,
            Err(e) => {
                warn!("Bulk shortcut unavailable: {}", e);
                return None;
            }
        };

        let listing = match invoke_isolated(list_tool, &ValidatedArguments::new()).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Bulk shortcut list call failed: {}", e);
                return None;
            }
        };

        let ids = self.bulk.extract_ids(&listing);
        debug!("Bulk shortcut collected {} id(s) from '{}'", ids.len(), list_tool.name());

        let mut raw = RawArguments::new();
        raw.insert(
            self.bulk.id_field().to_string(),
            Value::Array(ids.into_iter().map(Value::from).collect()),
        );
        Some(raw)
    }

    async fn extract_with_model(&self, spec: &ToolSpec, window: &[Turn]) -> RawArguments {
        let prompt =
            PromptTemplate::extraction_prompt(spec.definition(), &ConversationContext::render(window));

        match complete_with_timeout(self.backend.as_ref(), &prompt, &self.options, self.timeout)
            .await
        {
            Ok(response) => {
                let raw = parse_raw_arguments(&response);
                debug!(
                    "Extracted {} argument(s) for '{}' from '{}'",
                    raw.len(),
                    spec.name(),
                    single_line_preview(&response, 80)
                );
                raw
            }
            Err(e) => {
                warn!("Argument extraction for '{}' failed: {}", spec.name(), e);
                RawArguments::new()
            }
        }
    }
}
