//! RESTx Core Types
//!
//! Parameter types and conversion rules, the descriptor data model, the
//! schema wire codec and server settings. Nothing in this crate does I/O
//! apart from reading a settings file.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod descriptor;
pub mod error;
pub mod json;
pub mod method;
pub mod parameter;
pub mod settings;
pub mod types;
pub mod wire;

// Re-exports
pub use descriptor::{ComponentDescriptor, ServiceDefinition, DESC_PARAM, SUGGESTED_NAME_PARAM};
pub use error::{NameKind, RestxError, Result, SchemaObject};
pub use json::Value;
pub use method::{HttpMethod, UnknownMethod};
pub use parameter::ParameterDefinition;
pub use settings::{Settings, SettingsError};
pub use types::ParameterType;
pub use wire::{ListingEntry, ServerMeta, WireComponent, WireResource};
