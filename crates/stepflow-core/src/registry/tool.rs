//! Tool registry for managing available tools.

use std::sync::Arc;

use stepflow_protocols::error::RegistryError;
use stepflow_protocols::tool::{Tool, ToolDefinition};

use super::base::{BaseRegistry, Registerable};

impl Registerable for dyn Tool {
    fn registry_id(&self) -> &str {
        &self.definition().name
    }
}

/// Registry for managing tools.
///
/// Built on `BaseRegistry` for consistent behavior.
pub struct ToolRegistry {
    inner: BaseRegistry<dyn Tool>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new() -> Self {
        Self {
            inner: BaseRegistry::new(),
        }
    }

    /// Register a tool.
    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        self.inner.insert(tool)
    }

    /// Unregister a tool by name.
    pub fn unregister(&self, name: &str) -> Result<(), RegistryError> {
        self.inner.remove(name)
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.inner.get(name)
    }

    /// Check if a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    /// List all tool definitions.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.inner
            .snapshot()
            .into_iter()
            .map(|t| t.definition().clone())
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
