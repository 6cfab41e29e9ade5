//! Configuration file loading for parley
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `PARLEY_*` environment variables (`__` separates nested keys)
//! 2. `--config <path>` specified file
//! 3. Project root: `./parley.toml` or `./.parley.toml`
//! 4. Global: `~/.config/parley/config.toml`
//! 5. Default values

mod file_config;
mod issues;
mod loader;

pub use file_config::{
    FileBackendConfig, FileBulkConfig, FileConfig, FileConversationConfig, FileDateTimeConfig,
    FileGenerationConfig, FileLoggingConfig, FileReplConfig, FileStageOptions, FileTasksConfig,
    FileToolsConfig, FileWeatherConfig, KNOWN_PROVIDERS, StoreKind,
};
pub use issues::{ConfigIssue, ConfigIssueCode, Severity};
pub use loader::ConfigLoader;
