//! RESTx Client
//!
//! Fetches component and resource schemas from a RESTx server, checks
//! caller-supplied values against them and sends well-formed JSON
//! requests. The transport is pluggable; [`HttpTransport`] is the default
//! and [`mock::RecordingTransport`] scripts replies for tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod mock;
pub mod remote;
pub mod service;
pub mod transport;

pub use client::{Client, Response};
pub use remote::{RemoteComponent, RemoteResource, ResourceTemplate};
pub use service::{BoundService, PreparedRequest};
pub use transport::{HttpReply, HttpRequest, HttpTransport, Transport, TransportError};
