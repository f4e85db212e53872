//! Component trait and the memoized descriptor.

use crate::builder::build_descriptor;
use crate::capabilities::Capabilities;
use crate::declare::ComponentSpec;
use indexmap::IndexMap;
use restx_core::{ComponentDescriptor, Result, Value};
use std::sync::{Arc, PoisonError, RwLock};

/// A resolved call of one service on one resource
#[derive(Clone)]
pub struct ServiceCall {
    /// Name of the called service
    pub service: String,
    /// Name of the resource the call targets
    pub resource: String,
    /// The resource's creation parameter values
    pub resource_params: IndexMap<String, Value>,
    /// The call's arguments, converted to their parameter types
    pub args: IndexMap<String, Value>,
    /// Decoded request body, if any
    pub body: Option<Value>,
    /// Capabilities offered by the host, if configured
    pub capabilities: Option<Arc<dyn Capabilities>>,
}

impl ServiceCall {
    /// Argument value by name
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Resource creation parameter value by name
    #[must_use]
    pub fn resource_param(&self, name: &str) -> Option<&Value> {
        self.resource_params.get(name)
    }
}

impl std::fmt::Debug for ServiceCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCall")
            .field("service", &self.service)
            .field("resource", &self.resource)
            .field("args", &self.args)
            .field("body", &self.body)
            .field("capabilities", &self.capabilities.is_some())
            .finish_non_exhaustive()
    }
}

/// A component's answer to a service call
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// HTTP status to answer with
    pub status: u16,
    /// JSON body
    pub body: Value,
}

impl Reply {
    /// A `200` reply
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// A reply with an explicit status
    #[must_use]
    pub fn with_status(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Lazily built, cached descriptor
///
/// Concurrent first builds may both run; the last one stored wins. A failed
/// build stores nothing.
#[derive(Debug, Default)]
pub struct DescriptorCell {
    slot: RwLock<Option<Arc<ComponentDescriptor>>>,
}

impl DescriptorCell {
    /// Create an empty cell
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Return the cached descriptor, building it first if needed
    ///
    /// # Errors
    ///
    /// Returns the build error; the cell stays empty
    pub fn get_or_build<F>(&self, build: F) -> Result<Arc<ComponentDescriptor>>
    where
        F: FnOnce() -> Result<ComponentDescriptor>,
    {
        if let Some(cached) = self.get() {
            return Ok(cached);
        }
        let built = Arc::new(build()?);
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::clone(&built));
        Ok(built)
    }

    /// The cached descriptor, if built
    #[must_use]
    pub fn get(&self) -> Option<Arc<ComponentDescriptor>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check whether a descriptor is cached
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.get().is_some()
    }
}

/// A capability surface published by the server
pub trait Component: Send + Sync {
    /// The component's registration table
    fn spec(&self) -> ComponentSpec;

    /// Cell holding this instance's descriptor
    fn descriptor_cell(&self) -> &DescriptorCell;

    /// Run one service call
    ///
    /// # Errors
    ///
    /// Returns error if the service fails or is unknown
    fn call(&self, call: ServiceCall) -> Result<Reply>;

    /// The component's descriptor, built on first use
    ///
    /// # Errors
    ///
    /// Returns error if the registration table does not build
    fn descriptor(&self) -> Result<Arc<ComponentDescriptor>> {
        self.descriptor_cell()
            .get_or_build(|| build_descriptor(&self.spec()))
    }

    /// Component name
    fn name(&self) -> String {
        self.spec().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::{HostType, ParamDecl, ServiceDecl};
    use restx_core::RestxError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        cell: DescriptorCell,
        specs: AtomicUsize,
        broken: bool,
    }

    impl Component for Counting {
        fn spec(&self) -> ComponentSpec {
            self.specs.fetch_add(1, Ordering::SeqCst);
            let mut decl = ParamDecl::new("n", HostType::Integer, "");
            if self.broken {
                decl = decl.with_default("nope");
            }
            ComponentSpec::new("Counting", "", "").service(ServiceDecl::new("s", "").param(decl))
        }

        fn descriptor_cell(&self) -> &DescriptorCell {
            &self.cell
        }

        fn call(&self, call: ServiceCall) -> Result<Reply> {
            Ok(Reply::ok(Value::String(call.service)))
        }
    }

    fn counting(broken: bool) -> Counting {
        Counting {
            cell: DescriptorCell::new(),
            specs: AtomicUsize::new(0),
            broken,
        }
    }

    #[test]
    fn test_descriptor_memoized() {
        let c = counting(false);
        let a = c.descriptor().unwrap();
        let b = c.descriptor().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(c.specs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_build_caches_nothing() {
        let c = counting(true);
        assert!(matches!(c.descriptor(), Err(RestxError::TypeMismatch { .. })));
        assert!(!c.descriptor_cell().is_built());
        assert!(c.descriptor().is_err());
        assert_eq!(c.specs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_first_builds_converge() {
        let c = Arc::new(counting(false));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || c.descriptor().unwrap())
            })
            .collect();
        let built: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for d in &built {
            assert_eq!(**d, *built[0]);
        }
        assert!(c.descriptor_cell().is_built());
    }

    #[test]
    fn test_reply_constructors() {
        assert_eq!(Reply::ok(Value::Null).status, 200);
        assert_eq!(Reply::with_status(201, Value::Null).status, 201);
    }
}
