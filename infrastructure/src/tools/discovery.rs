//! Tool discovery
//!
//! [`ToolDiscovery`] collects [`ToolProvider`]s at start-up and merges their
//! tools into one read-only [`ToolRegistry`].
//!
//! # Usage
//!
//! ```ignore
//! use parley_infrastructure::tools::{MathProvider, TaskProvider, TaskBook, ToolDiscovery};
//!
//! let mut discovery = ToolDiscovery::new()
//!     .register(MathProvider)
//!     .register(TaskProvider::new(Arc::new(TaskBook::in_memory())));
//!
//! let registry = discovery.discover().await;
//! assert!(registry.contains("add_task"));
//! ```
//!
//! # Priority-Based Resolution
//!
//! Providers are visited in descending priority. When two providers offer
//! the same tool name (case-insensitively), the first one visited keeps it
//! and the later one is skipped. Unavailable providers contribute nothing.

use parley_domain::{ToolProvider, ToolRegistry};
use std::collections::HashMap;
use std::sync::Arc;

pub struct ToolDiscovery {
    /// Registered providers
    providers: Vec<Arc<dyn ToolProvider>>,
    /// Lowercased tool name -> provider ID (filled by discovery)
    tool_mapping: HashMap<String, String>,
}

impl ToolDiscovery {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            tool_mapping: HashMap::new(),
        }
    }

    /// Register a tool provider
    pub fn register<P: ToolProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Register a tool provider (Arc version)
    pub fn register_arc(mut self, provider: Arc<dyn ToolProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Build the registry from every available provider.
    ///
    /// Registration order inside the registry follows provider priority,
    /// then each provider's own tool order; it is also the router's
    /// tie-break order.
    pub async fn discover(&mut self) -> ToolRegistry {
        // Stable sort keeps registration order among equal priorities
        self.providers.sort_by_key(|p| std::cmp::Reverse(p.priority()));

        let mut registry = ToolRegistry::new();
        let mut tool_mapping = HashMap::new();

        for provider in &self.providers {
            if !provider.is_available().await {
                tracing::debug!(provider = provider.id(), "Provider not available, skipping");
                continue;
            }

            match provider.discover_tools().await {
                Ok(tools) => {
                    for tool in tools {
                        let key = tool.name().to_lowercase();
                        if tool_mapping.contains_key(&key) {
                            tracing::trace!(
                                tool = tool.name(),
                                provider = provider.id(),
                                "Tool already registered by higher priority provider"
                            );
                            continue;
                        }
                        tracing::debug!(
                            tool = tool.name(),
                            provider = provider.id(),
                            "Registered tool"
                        );
                        if let Err(e) = registry.register(tool) {
                            tracing::warn!(provider = provider.id(), error = %e, "Skipping tool");
                            continue;
                        }
                        tool_mapping.insert(key, provider.id().to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.id(),
                        error = %e,
                        "Failed to discover tools from provider"
                    );
                }
            }
        }

        self.tool_mapping = tool_mapping;
        registry
    }

    /// Provider that contributed `tool_name` in the last discovery
    pub fn provider_for(&self, tool_name: &str) -> Option<&str> {
        self.tool_mapping
            .get(&tool_name.to_lowercase())
            .map(String::as_str)
    }

    /// Get a list of registered provider IDs
    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Get statistics about the last discovery
    pub fn stats(&self) -> DiscoveryStats {
        let mut tools_per_provider = HashMap::new();
        for provider_id in self.tool_mapping.values() {
            *tools_per_provider.entry(provider_id.clone()).or_insert(0) += 1;
        }

        DiscoveryStats {
            total_providers: self.providers.len(),
            total_tools: self.tool_mapping.len(),
            tools_per_provider,
        }
    }
}

impl Default for ToolDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about a discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryStats {
    pub total_providers: usize,
    pub total_tools: usize,
    pub tools_per_provider: HashMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_domain::{ProviderError, ToolDefinition, ToolSpec, ValidatedArguments};

    struct MockProvider {
        id: &'static str,
        priority: i32,
        available: bool,
        tools: Vec<(&'static str, &'static str)>,
    }

    impl MockProvider {
        fn new(id: &'static str, priority: i32, tools: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                id,
                priority,
                available: true,
                tools,
            }
        }

        fn unavailable(mut self) -> Self {
            self.available = false;
            self
        }
    }

    #[async_trait]
    impl ToolProvider for MockProvider {
        fn id(&self) -> &str {
            self.id
        }

        fn display_name(&self) -> &str {
            self.id
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        async fn discover_tools(&self) -> Result<Vec<ToolSpec>, ProviderError> {
            Ok(self
                .tools
                .iter()
                .map(|(name, output)| {
                    let output = output.to_string();
                    ToolSpec::from_sync_fn(ToolDefinition::new(*name, *name), move |_| {
                        Ok(output.clone())
                    })
                })
                .collect())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ToolProvider for FailingProvider {
        fn id(&self) -> &str {
            "failing"
        }

        fn display_name(&self) -> &str {
            "Failing"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn discover_tools(&self) -> Result<Vec<ToolSpec>, ProviderError> {
            Err(ProviderError::DiscoveryFailed("boom".into()))
        }
    }

    #[tokio::test]
    async fn test_priority_resolution() {
        let mut discovery = ToolDiscovery::new()
            .register(MockProvider::new("low", 0, vec![("search", "low")]))
            .register(MockProvider::new("high", 10, vec![("Search", "high"), ("fetch", "high")]));

        let registry = discovery.discover().await;
        assert_eq!(registry.len(), 2);
        assert_eq!(discovery.provider_for("search"), Some("high"));

        let output = registry
            .get("search")
            .unwrap()
            .invoke(&ValidatedArguments::new())
            .await
            .unwrap();
        assert_eq!(output, "high");

        // Higher priority tools come first in router order
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Search", "fetch"]);
    }

    #[tokio::test]
    async fn test_equal_priority_keeps_registration_order() {
        let mut discovery = ToolDiscovery::new()
            .register(MockProvider::new("math", 0, vec![("add", "")]))
            .register(MockProvider::new("tasks", 0, vec![("add_task", "")]));

        let registry = discovery.discover().await;
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["add", "add_task"]);
    }

    #[tokio::test]
    async fn test_unavailable_and_failing_providers_are_skipped() {
        let mut discovery = ToolDiscovery::new()
            .register(MockProvider::new("offline", 100, vec![("weather", "")]).unavailable())
            .register(FailingProvider)
            .register(MockProvider::new("math", 0, vec![("add", "")]));

        let registry = discovery.discover().await;
        assert!(!registry.contains("weather"));
        assert!(registry.contains("add"));

        let stats = discovery.stats();
        assert_eq!(stats.total_providers, 3);
        assert_eq!(stats.total_tools, 1);
        assert_eq!(stats.tools_per_provider.get("math"), Some(&1));
    }
}
