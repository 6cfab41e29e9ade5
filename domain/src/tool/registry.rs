//! Tool registry
//!
//! The catalog of callable tools, keyed case-insensitively by name and kept
//! in registration order. Built once at start-up and shared read-only
//! (`Arc<ToolRegistry>`) afterwards.

use super::capability::ToolSpec;
use std::collections::HashMap;
use thiserror::Error;

/// What `register` does when a name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Refuse the new spec with [`RegistryError::DuplicateTool`]
    #[default]
    Reject,
    /// Swap the new spec in, keeping the original registration position
    Replace,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
    /// Lower-cased name → index into `specs`
    index: HashMap<String, usize>,
    policy: DuplicatePolicy,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Add a tool, or replace/reject an existing one per the duplicate policy.
    pub fn register(&mut self, spec: ToolSpec) -> Result<(), RegistryError> {
        let key = spec.name().to_lowercase();
        match self.index.get(&key) {
            Some(&pos) => match self.policy {
                DuplicatePolicy::Reject => Err(RegistryError::DuplicateTool(spec.name().into())),
                DuplicatePolicy::Replace => {
                    self.specs[pos] = spec;
                    Ok(())
                }
            },
            None => {
                self.index.insert(key, self.specs.len());
                self.specs.push(spec);
                Ok(())
            }
        }
    }

    /// Look up a tool by name, ignoring case
    pub fn get(&self, name: &str) -> Result<&ToolSpec, RegistryError> {
        self.index
            .get(&name.to_lowercase())
            .map(|&pos| &self.specs[pos])
            .ok_or_else(|| RegistryError::ToolNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// `(name, description)` pairs in registration order
    pub fn describe_all(&self) -> Vec<(&str, &str)> {
        self.specs
            .iter()
            .map(|s| (s.name(), s.description()))
            .collect()
    }

    /// Tool names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
