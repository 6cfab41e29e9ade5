//! Wire types for the Ollama `/api/generate` endpoint.

use parley_domain::CompletionOptions;
use serde::{Deserialize, Serialize};

/// Request body for `/api/generate`
#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    #[serde(skip_serializing_if = "GenerateOptions::is_empty")]
    pub options: GenerateOptions,
}

/// Sampling options understood by Ollama.
///
/// Per-call values come from [`CompletionOptions`]; `top_p`, `top_k` and
/// `repeat_penalty` are backend-wide settings.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub(crate) struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
}

impl GenerateOptions {
    pub fn from_completion(options: &CompletionOptions, sampling: &SamplingSettings) -> Self {
        Self {
            temperature: options.temperature,
            num_predict: options.max_tokens,
            stop: options.stop.clone(),
            top_p: sampling.top_p,
            top_k: sampling.top_k,
            repeat_penalty: sampling.repeat_penalty,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Backend-wide sampling knobs
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SamplingSettings {
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub repeat_penalty: Option<f32>,
}

/// One object of a `/api/generate` reply.
///
/// A non-streaming reply is a single object with `done: true`; a streaming
/// reply is one object per line. Errors come back as `{"error": "..."}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}
