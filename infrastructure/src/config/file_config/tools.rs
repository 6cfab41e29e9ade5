//! Tools configuration from TOML (`[tools]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [tools]
//! providers = ["math", "tasks", "datetime"]   # weather left out
//!
//! [tools.bulk]
//! keywords = ["all", "every", "wszystkie"]
//!
//! [tools.tasks]
//! file = "~/.local/share/parley/tasks.json"
//!
//! [tools.weather]
//! api_key_env = "OWM_KEY"
//! lang = "en"
//! ```

use super::expand_path;
use crate::config::issues::{ConfigIssue, ConfigIssueCode};
use crate::tools::WeatherSettings;
use parley_domain::{
    BulkPolicy, DEFAULT_BULK_TOOLS, DEFAULT_ID_FIELD, DEFAULT_ID_PATTERN, DEFAULT_KEYWORDS,
    DEFAULT_LIST_TOOL,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Provider ids understood by the binary, in registration order
pub const KNOWN_PROVIDERS: &[&str] = &["math", "tasks", "datetime", "weather"];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Raw tools configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Enabled tool providers
    pub providers: Vec<String>,
    pub bulk: FileBulkConfig,
    pub tasks: FileTasksConfig,
    pub datetime: FileDateTimeConfig,
    pub weather: FileWeatherConfig,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        Self {
            providers: strings(KNOWN_PROVIDERS),
            bulk: FileBulkConfig::default(),
            tasks: FileTasksConfig::default(),
            datetime: FileDateTimeConfig::default(),
            weather: FileWeatherConfig::default(),
        }
    }
}

impl FileToolsConfig {
    pub fn is_enabled(&self, provider: &str) -> bool {
        self.providers.iter().any(|p| p.eq_ignore_ascii_case(provider))
    }

    pub fn unknown_provider_issues(&self) -> Vec<ConfigIssue> {
        self.providers
            .iter()
            .filter(|p| !KNOWN_PROVIDERS.iter().any(|k| k.eq_ignore_ascii_case(p)))
            .map(|p| {
                ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "tools.providers".to_string(),
                        value: p.clone(),
                        valid_values: strings(KNOWN_PROVIDERS),
                    },
                    format!("tools.providers: unknown provider '{}' is ignored", p),
                )
            })
            .collect()
    }
}

/// Bulk shortcut settings (`[tools.bulk]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBulkConfig {
    pub enabled: bool,
    /// Words meaning "all items", matched as whole words
    pub keywords: Vec<String>,
    /// Tools the shortcut applies to
    pub bulk_tools: Vec<String>,
    /// Tool whose output lists the ids
    pub list_tool: String,
    /// Argument that receives the collected ids
    pub id_field: String,
    /// Regex with one capture group for an id
    pub id_pattern: String,
}

impl Default for FileBulkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keywords: strings(DEFAULT_KEYWORDS),
            bulk_tools: strings(DEFAULT_BULK_TOOLS),
            list_tool: DEFAULT_LIST_TOOL.to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            id_pattern: DEFAULT_ID_PATTERN.to_string(),
        }
    }
}

impl FileBulkConfig {
    /// Build the policy. An invalid pattern disables the shortcut.
    pub fn to_policy(&self) -> (BulkPolicy, Vec<ConfigIssue>) {
        if !self.enabled {
            return (BulkPolicy::disabled(), Vec::new());
        }
        match BulkPolicy::new(
            self.keywords.clone(),
            self.bulk_tools.clone(),
            self.list_tool.clone(),
            self.id_field.clone(),
            &self.id_pattern,
        ) {
            Ok(policy) => (policy, Vec::new()),
            Err(e) => (
                BulkPolicy::disabled(),
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidPattern {
                        field: "tools.bulk.id_pattern".to_string(),
                        pattern: self.id_pattern.clone(),
                    },
                    format!(
                        "tools.bulk: invalid pattern, bulk shortcut disabled ({})",
                        e
                    ),
                )],
            ),
        }
    }
}

/// Task manager settings (`[tools.tasks]`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTasksConfig {
    /// JSON file for tasks; in-memory when unset
    pub file: Option<String>,
}

impl FileTasksConfig {
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.as_deref().map(expand_path)
    }
}

/// Date/time tool settings (`[tools.datetime]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDateTimeConfig {
    /// chrono `strftime` format
    pub format: String,
}

impl Default for FileDateTimeConfig {
    fn default() -> Self {
        Self {
            format: crate::tools::datetime::DEFAULT_FORMAT.to_string(),
        }
    }
}

/// Weather tool settings (`[tools.weather]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWeatherConfig {
    /// Environment variable holding the OpenWeatherMap key
    pub api_key_env: String,
    pub base_url: String,
    /// "metric", "imperial" or "standard"
    pub units: String,
    pub lang: String,
    pub timeout_secs: u64,
}

impl Default for FileWeatherConfig {
    fn default() -> Self {
        let defaults = WeatherSettings::default();
        Self {
            api_key_env: defaults.api_key_env,
            base_url: defaults.base_url,
            units: defaults.units,
            lang: defaults.lang,
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

impl FileWeatherConfig {
    pub fn to_settings(&self) -> (WeatherSettings, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let valid = ["metric", "imperial", "standard"];
        let units = if valid.contains(&self.units.as_str()) {
            self.units.clone()
        } else {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidEnumValue {
                    field: "tools.weather.units".to_string(),
                    value: self.units.clone(),
                    valid_values: strings(&valid),
                },
                format!(
                    "tools.weather.units: unknown value '{}', falling back to 'metric'",
                    self.units
                ),
            ));
            "metric".to_string()
        };

        let settings = WeatherSettings {
            api_key_env: self.api_key_env.clone(),
            base_url: self.base_url.clone(),
            units,
            lang: self.lang.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        };
        (settings, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bulk_policy_is_enabled() {
        let (policy, issues) = FileBulkConfig::default().to_policy();
        assert!(issues.is_empty());
        assert!(policy.triggers("delete_task", "usuń wszystkie zadania"));
    }

    #[test]
    fn test_invalid_pattern_disables_bulk() {
        let config = FileBulkConfig {
            id_pattern: "[ID: (".to_string(),
            ..Default::default()
        };
        let (policy, issues) = config.to_policy();
        assert!(!policy.is_enabled());
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues[0].code,
            ConfigIssueCode::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_pattern_without_capture_group_disables_bulk() {
        let config = FileBulkConfig {
            id_pattern: r"\d+".to_string(),
            ..Default::default()
        };
        let (policy, issues) = config.to_policy();
        assert!(!policy.is_enabled());
        assert!(!policy.triggers("delete_task", "usuń wszystkie zadania"));
        assert_eq!(issues.len(), 1);
        match &issues[0].code {
            ConfigIssueCode::InvalidPattern { field, pattern } => {
                assert_eq!(field, "tools.bulk.id_pattern");
                assert_eq!(pattern, r"\d+");
            }
            other => panic!("unexpected issue: {other:?}"),
        }
        assert!(issues[0].message.contains("no capture group"));
    }

    #[test]
    fn test_providers() {
        let config: FileToolsConfig = toml::from_str(r#"providers = ["math", "Tasks", "mcp"]"#).unwrap();
        assert!(config.is_enabled("tasks"));
        assert!(!config.is_enabled("weather"));
        let issues = config.unknown_provider_issues();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("mcp"));
    }

    #[test]
    fn test_weather_units_fallback() {
        let config = FileWeatherConfig {
            units: "kelvin".to_string(),
            ..Default::default()
        };
        let (settings, issues) = config.to_settings();
        assert_eq!(settings.units, "metric");
        assert_eq!(issues.len(), 1);
    }
}
