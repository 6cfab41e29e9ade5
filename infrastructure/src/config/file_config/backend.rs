//! Completion backend configuration from TOML (`[backend]` section)

use crate::config::issues::{ConfigIssue, ConfigIssueCode};
use crate::ollama::{DEFAULT_HOST, DEFAULT_MODEL, OllamaSettings, SamplingSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw backend configuration from TOML.
///
/// Timeouts are in seconds; `0` disables the request and stream timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Ollama server URL
    pub host: String,
    /// Model name, e.g. "gemma3:12b"
    pub model: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Maximum silence between two streamed fragments
    pub stream_idle_timeout_secs: u64,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub repeat_penalty: Option<f32>,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
            stream_idle_timeout_secs: 60,
            top_p: None,
            top_k: None,
            repeat_penalty: None,
        }
    }
}

fn optional_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl FileBackendConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        optional_secs(self.request_timeout_secs)
    }

    pub fn stream_idle_timeout(&self) -> Option<Duration> {
        optional_secs(self.stream_idle_timeout_secs)
    }

    /// Convert to backend settings. Empty host or model fall back to the
    /// defaults and are reported.
    pub fn to_ollama_settings(&self) -> (OllamaSettings, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let defaults = FileBackendConfig::default();

        let model = if self.model.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyValue {
                    field: "backend.model".to_string(),
                },
                format!("backend.model is empty, using '{}'", defaults.model),
            ));
            defaults.model
        } else {
            self.model.trim().to_string()
        };

        let host = if self.host.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyValue {
                    field: "backend.host".to_string(),
                },
                format!("backend.host is empty, using '{}'", defaults.host),
            ));
            defaults.host
        } else {
            self.host.trim().to_string()
        };

        if let Some(top_p) = self.top_p
            && !(0.0..=1.0).contains(&top_p)
        {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "backend.top_p".to_string(),
                    value: top_p.to_string(),
                },
                format!("backend.top_p should be between 0 and 1, got {}", top_p),
            ));
        }

        let settings = OllamaSettings {
            host,
            model,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
            sampling: SamplingSettings {
                top_p: self.top_p,
                top_k: self.top_k,
                repeat_penalty: self.repeat_penalty,
            },
        };
        (settings, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_disables_timeouts() {
        let config = FileBackendConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.request_timeout().is_none());
        assert_eq!(config.stream_idle_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_empty_model_falls_back() {
        let config = FileBackendConfig {
            model: "  ".to_string(),
            top_k: Some(40),
            ..Default::default()
        };
        let (settings, issues) = config.to_ollama_settings();
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.sampling.top_k, Some(40));
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }
}
