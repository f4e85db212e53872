//! Registry of the components a server publishes.

use crate::component::Component;
use indexmap::IndexMap;
use restx_core::{ComponentDescriptor, NameKind, RestxError, Result};
use std::sync::{Arc, PoisonError, RwLock};

/// Components by name, in registration order
pub struct ComponentRegistry {
    components: IndexMap<String, Arc<dyn Component>>,
}

impl ComponentRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            components: IndexMap::new(),
        }
    }

    /// Register a component
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if a component with that name is registered
    pub fn register(&mut self, component: Arc<dyn Component>) -> Result<()> {
        let name = component.name();
        if self.components.contains_key(&name) {
            return Err(RestxError::DuplicateName {
                kind: NameKind::Component,
                name,
            });
        }
        tracing::debug!(component = %name, "registered component");
        self.components.insert(name, component);
        Ok(())
    }

    /// Get a component by name
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if no such component is registered
    pub fn get(&self, name: &str) -> Result<Arc<dyn Component>> {
        self.components
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| RestxError::unknown(NameKind::Component, name))
    }

    /// Descriptor of a registered component
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` for an unknown component, or the build error
    pub fn descriptor(&self, name: &str) -> Result<Arc<ComponentDescriptor>> {
        self.get(name)?.descriptor()
    }

    /// Names of all registered components
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.components.keys().cloned().collect()
    }

    /// Check if a component is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Remove a component
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if no such component is registered
    pub fn unregister(&mut self, name: &str) -> Result<()> {
        self.components
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| RestxError::unknown(NameKind::Component, name))
    }

    /// Get the count of registered components
    #[must_use]
    pub fn count(&self) -> usize {
        self.components.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe registry for concurrent access
pub struct SharedRegistry {
    inner: RwLock<ComponentRegistry>,
}

impl SharedRegistry {
    /// Create a new shared registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ComponentRegistry::new()),
        }
    }

    /// Register a component
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if a component with that name is registered
    pub fn register(&self, component: Arc<dyn Component>) -> Result<()> {
        let mut registry = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        registry.register(component)
    }

    /// Get a component by name
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if no such component is registered
    pub fn get(&self, name: &str) -> Result<Arc<dyn Component>> {
        let registry = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        registry.get(name)
    }

    /// Descriptor of a registered component
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` for an unknown component, or the build error
    pub fn descriptor(&self, name: &str) -> Result<Arc<ComponentDescriptor>> {
        // Build outside the lock.
        self.get(name)?.descriptor()
    }

    /// Names of all registered components
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let registry = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        registry.list()
    }
}

impl Default for SharedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ComponentRegistry> for SharedRegistry {
    fn from(registry: ComponentRegistry) -> Self {
        Self {
            inner: RwLock::new(registry),
        }
    }
}
