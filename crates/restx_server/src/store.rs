//! In-memory resource store.

use indexmap::IndexMap;
use restx_core::{NameKind, RestxError, Result, Value};
use std::sync::{PoisonError, RwLock};

/// A resource created from a component
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResource {
    /// Resource name
    pub name: String,
    /// Resource description
    pub description: String,
    /// Name of the component the resource was created from
    pub component: String,
    /// Resolved creation parameter values
    pub params: IndexMap<String, Value>,
}

/// Resources by name, in creation order
#[derive(Debug, Default)]
pub struct ResourceStore {
    resources: RwLock<IndexMap<String, StoredResource>>,
}

impl ResourceStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if the name is taken
    pub fn insert(&self, resource: StoredResource) -> Result<()> {
        let mut resources = self
            .resources
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if resources.contains_key(&resource.name) {
            return Err(RestxError::DuplicateName {
                kind: NameKind::Resource,
                name: resource.name,
            });
        }
        resources.insert(resource.name.clone(), resource);
        Ok(())
    }

    /// Get a resource by name
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if there is no such resource
    pub fn get(&self, name: &str) -> Result<StoredResource> {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| RestxError::unknown(NameKind::Resource, name))
    }

    /// Remove a resource
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if there is no such resource
    pub fn remove(&self, name: &str) -> Result<StoredResource> {
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(name)
            .ok_or_else(|| RestxError::unknown(NameKind::Resource, name))
    }

    /// All resources, in creation order
    #[must_use]
    pub fn list(&self) -> Vec<StoredResource> {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Number of stored resources
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
