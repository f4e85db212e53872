//! RESTx Component System
//!
//! Components declare their capability surface in a registration table.
//! The builder turns the table into a descriptor once per instance, and
//! the registry hands components to the server by name.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod args;
pub mod builder;
pub mod capabilities;
pub mod component;
pub mod declare;
pub mod registry;

pub use args::{resolve_call, resolve_values};
pub use builder::build_descriptor;
pub use capabilities::{Capabilities, CapabilityError, FileStorage, HttpAccess, HttpResult};
pub use component::{Component, DescriptorCell, Reply, ServiceCall};
pub use declare::{ComponentSpec, HostType, ParamDecl, ServiceDecl};
pub use registry::{ComponentRegistry, SharedRegistry};
