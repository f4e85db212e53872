//! RESTx Server
//!
//! Publishes component descriptors over HTTP, creates resources from them
//! and dispatches service calls to the owning component.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod error;
pub mod sample;
pub mod store;

pub use api::{ApiServer, AppState, router};
pub use error::{ApiError, status_for};
pub use sample::SampleComponent;
pub use store::{ResourceStore, StoredResource};
