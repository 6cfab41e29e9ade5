//! Tool capabilities and the registered [`ToolSpec`]

use super::entities::ToolDefinition;
use super::value_objects::{ToolError, ValidatedArguments};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// The side-effecting half of a tool.
///
/// Implementations only ever see arguments that passed the schema validator
/// for their own definition.
#[async_trait]
pub trait ToolCapability: Send + Sync {
    async fn invoke(&self, args: &ValidatedArguments) -> Result<String, ToolError>;
}

/// Capability backed by an async closure
struct FnCapability<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> ToolCapability for FnCapability<F>
where
    F: Fn(ValidatedArguments) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ToolError>> + Send,
{
    async fn invoke(&self, args: &ValidatedArguments) -> Result<String, ToolError> {
        (self.f)(args.clone()).await
    }
}

/// Capability backed by a plain function
struct SyncFnCapability<F> {
    f: F,
}

#[async_trait]
impl<F> ToolCapability for SyncFnCapability<F>
where
    F: Fn(&ValidatedArguments) -> Result<String, ToolError> + Send + Sync,
{
    async fn invoke(&self, args: &ValidatedArguments) -> Result<String, ToolError> {
        (self.f)(args)
    }
}

/// A registered tool: its definition plus the capability that runs it.
///
/// Immutable once built. Cloning shares the capability.
#[derive(Clone)]
pub struct ToolSpec {
    definition: ToolDefinition,
    capability: Arc<dyn ToolCapability>,
}

impl ToolSpec {
    /// Build a spec from an async closure
    pub fn from_fn<F, Fut>(definition: ToolDefinition, f: F) -> Self
    where
        F: Fn(ValidatedArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        Self::from_capability(definition, FnCapability { f })
    }

    /// Build a spec from a synchronous closure
    pub fn from_sync_fn<F>(definition: ToolDefinition, f: F) -> Self
    where
        F: Fn(&ValidatedArguments) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self::from_capability(definition, SyncFnCapability { f })
    }

    /// Build a spec from a capability object
    pub fn from_capability(
        definition: ToolDefinition,
        capability: impl ToolCapability + 'static,
    ) -> Self {
        Self::from_shared(definition, Arc::new(capability))
    }

    /// Build a spec around a capability shared by several tools (e.g. one
    /// task store behind four task tools)
    pub fn from_shared(definition: ToolDefinition, capability: Arc<dyn ToolCapability>) -> Self {
        Self {
            definition,
            capability,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn description(&self) -> &str {
        &self.definition.description
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    pub fn capability(&self) -> Arc<dyn ToolCapability> {
        Arc::clone(&self.capability)
    }

    pub async fn invoke(&self, args: &ValidatedArguments) -> Result<String, ToolError> {
        self.capability.invoke(args).await
    }
}

impl fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSpec")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}
