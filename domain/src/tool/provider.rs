//! Tool provider abstraction
//!
//! A [`ToolProvider`] is a start-up registration unit: it hands a batch of
//! [`ToolSpec`]s to the discovery step, which merges every provider into one
//! [`ToolRegistry`](super::registry::ToolRegistry).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  ToolRegistry                        │
//! │   (built once from all providers, then read-only)    │
//! └──────────────────────────────────────────────────────┘
//!        ▲               ▲               ▲
//!        │               │               │
//!  ┌───────────┐   ┌───────────┐   ┌───────────┐
//!  │   Math    │   │   Tasks   │   │  Weather  │
//!  │ Provider  │   │ Provider  │   │ Provider  │
//!  └───────────┘   └───────────┘   └───────────┘
//! ```
//!
//! # Priority System
//!
//! When two providers offer the same tool name, the one with the higher
//! priority wins. Providers are merged in descending priority, so the
//! preferred spec is registered first and later ones are skipped.
//!
//! There is no filesystem or plugin scanning: providers are constructed
//! explicitly by the binary.

use async_trait::async_trait;
use thiserror::Error;

use super::capability::ToolSpec;

/// Error type for tool provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider is not available (e.g., an API key is not configured)
    #[error("Provider not available: {0}")]
    NotAvailable(String),

    /// Failed to build the provider's tools
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Source of tools assembled into the registry at start-up
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Unique identifier for this provider
    ///
    /// Examples: "math", "tasks", "weather"
    fn id(&self) -> &str;

    /// Display name for user-facing output
    fn display_name(&self) -> &str;

    /// Priority for tool resolution (higher = preferred)
    fn priority(&self) -> i32 {
        0
    }

    /// Check if the provider is available and properly configured
    async fn is_available(&self) -> bool;

    /// Build the tools this provider contributes
    async fn discover_tools(&self) -> Result<Vec<ToolSpec>, ProviderError>;

    /// Check if this provider has a specific tool
    async fn has_tool(&self, tool_name: &str) -> bool {
        match self.discover_tools().await {
            Ok(tools) => tools.iter().any(|t| t.name().eq_ignore_ascii_case(tool_name)),
            Err(_) => false,
        }
    }
}
