//! Provider registry for managing chat model backends.

use std::sync::Arc;

use stepflow_protocols::error::RegistryError;
use stepflow_protocols::provider::ChatProvider;

use super::base::{BaseRegistry, Registerable};

impl Registerable for dyn ChatProvider {
    fn registry_id(&self) -> &str {
        self.id()
    }
}

/// Registry for managing chat providers.
pub struct ProviderRegistry {
    inner: BaseRegistry<dyn ChatProvider>,
}

impl ProviderRegistry {
    /// Create a new provider registry.
    pub fn new() -> Self {
        Self {
            inner: BaseRegistry::new(),
        }
    }

    /// Register a provider.
    pub fn register(&self, provider: Arc<dyn ChatProvider>) -> Result<(), RegistryError> {
        self.inner.insert(provider)
    }

    /// Unregister a provider by ID.
    pub fn unregister(&self, id: &str) -> Result<(), RegistryError> {
        self.inner.remove(id)
    }

    /// Get a provider by ID.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ChatProvider>> {
        self.inner.get(id)
    }

    /// List all provider IDs.
    pub fn list_ids(&self) -> Vec<String> {
        self.inner.ids()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
