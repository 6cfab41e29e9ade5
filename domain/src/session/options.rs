//! Completion options

use serde::{Deserialize, Serialize};

/// Sampling options for a single completion request.
///
/// Backends map these onto their own request fields; `None` leaves the
/// backend default in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stop: Vec<String>,
}

impl CompletionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Low-temperature options for classification and extraction
    pub fn deterministic() -> Self {
        Self {
            temperature: Some(0.0),
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop.push(stop.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let opts = CompletionOptions::deterministic()
            .with_max_tokens(64)
            .with_stop("\n");
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, Some(64));
        assert_eq!(opts.stop, vec!["\n".to_string()]);
    }

    #[test]
    fn test_partial_toml_like_deserialize() {
        let opts: CompletionOptions = serde_json::from_str(r#"{"temperature": 0.7}"#).unwrap();
        assert_eq!(opts.temperature, Some(0.7));
        assert!(opts.max_tokens.is_none());
        assert!(opts.stop.is_empty());
    }
}
