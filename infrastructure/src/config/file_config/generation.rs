//! Per-stage sampling configuration from TOML (`[generation.*]` sections)
//!
//! ```toml
//! [generation.router]
//! temperature = 0.0
//! max_tokens = 16
//!
//! [generation.fallback]
//! temperature = 0.9
//! ```
//!
//! Unset fields keep the built-in per-stage defaults.

use parley_application::StageOptions;
use parley_domain::CompletionOptions;
use serde::{Deserialize, Serialize};

/// Overrides for one stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStageOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stop: Option<Vec<String>>,
}

impl FileStageOptions {
    fn apply(&self, mut base: CompletionOptions) -> CompletionOptions {
        if let Some(temperature) = self.temperature {
            base.temperature = Some(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            base.max_tokens = Some(max_tokens);
        }
        if let Some(stop) = &self.stop {
            base.stop = stop.clone();
        }
        base
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGenerationConfig {
    pub router: FileStageOptions,
    pub extraction: FileStageOptions,
    pub finalize: FileStageOptions,
    pub fallback: FileStageOptions,
}

impl FileGenerationConfig {
    pub fn to_stage_options(&self) -> StageOptions {
        let base = StageOptions::default();
        StageOptions {
            router: self.router.apply(base.router),
            extraction: self.extraction.apply(base.extraction),
            finalize: self.finalize.apply(base.finalize),
            fallback: self.fallback.apply(base.fallback),
        }
    }
}
