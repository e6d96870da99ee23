//! Generic keyed storage backing the typed registries.

use dashmap::DashMap;
use std::sync::Arc;

use stepflow_protocols::error::RegistryError;

/// An item a registry can hold, keyed by a unique ID.
pub trait Registerable: Send + Sync {
    fn registry_id(&self) -> &str;
}

/// Duplicate-checked map from ID to shared item.
///
/// `ToolRegistry` and `ProviderRegistry` wrap this with their concrete
/// trait-object types. Insertion never replaces: a taken ID must be removed
/// before it can be reused.
pub struct BaseRegistry<T: ?Sized + Registerable> {
    items: DashMap<String, Arc<T>>,
}

impl<T: ?Sized + Registerable> BaseRegistry<T> {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Insert an item under its own ID, rejecting duplicates.
    pub fn insert(&self, item: Arc<T>) -> Result<(), RegistryError> {
        let id = item.registry_id().to_string();
        match self.items.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(occupied) => {
                Err(RegistryError::AlreadyRegistered(occupied.key().clone()))
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(item);
                Ok(())
            }
        }
    }

    /// Remove the item under `id`, freeing the ID for reuse.
    pub fn remove(&self, id: &str) -> Result<(), RegistryError> {
        self.items
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.items.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// IDs currently registered, in no particular order.
    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Clones of every stored item, for callers that enumerate the
    /// registry contents.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.items.iter().map(|entry| entry.value().clone()).collect()
    }
}

impl<T: ?Sized + Registerable> Default for BaseRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
