//! Core error types for RESTx.

use std::fmt;

/// Core result type
pub type Result<T> = std::result::Result<T, RestxError>;

/// The object a schema decoder was working on when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaObject {
    /// Server root metadata
    ServerMeta,
    /// A component description
    Component,
    /// A resource description
    Resource,
    /// A service description
    Service,
    /// A parameter definition
    Parameter,
    /// A name/description/uri listing
    Listing,
}

impl fmt::Display for SchemaObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ServerMeta => "server meta data",
            Self::Component => "component",
            Self::Resource => "resource",
            Self::Service => "service",
            Self::Parameter => "parameter",
            Self::Listing => "listing",
        };
        f.write_str(name)
    }
}

/// Kind of named entity, used by name collision and lookup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    /// A component
    Component,
    /// A resource
    Resource,
    /// A service
    Service,
    /// A parameter
    Parameter,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Component => "Component",
            Self::Resource => "Resource",
            Self::Service => "Service",
            Self::Parameter => "Parameter",
        };
        f.write_str(name)
    }
}

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestxError {
    /// Wire data or a declaration does not describe a valid schema
    #[error("Malformed {object} definition: {reason}")]
    MalformedSchema {
        /// What was being decoded or built
        object: SchemaObject,
        /// Why it was rejected
        reason: String,
    },

    /// A name was declared twice within one scope
    #[error("{kind} '{name}' already exists")]
    DuplicateName {
        /// Kind of the duplicated entity
        kind: NameKind,
        /// The duplicated name
        name: String,
    },

    /// A value cannot be converted to the parameter's type
    #[error("Type value mismatch for parameter '{parameter}': '{value}' is not a valid {expected}")]
    TypeMismatch {
        /// Parameter the value was meant for
        parameter: String,
        /// Wire token of the expected type
        expected: String,
        /// Rendering of the offending value
        value: String,
    },

    /// A required parameter has no value
    #[error("Required parameter '{name}' is missing")]
    MissingParameter {
        /// Name of the missing parameter
        name: String,
    },

    /// The request method does not fit the request
    #[error("Invalid request method '{method}': {reason}")]
    InvalidMethod {
        /// The rejected method
        method: String,
        /// Why it was rejected
        reason: String,
    },

    /// The server answered with a status other than the expected one
    #[error("Status code {expected} was expected for request to '{uri}'. Instead we received {actual}")]
    UnexpectedStatus {
        /// Status the caller asked for
        expected: u16,
        /// Status the server sent
        actual: u16,
        /// Request target
        uri: String,
    },

    /// No response could be obtained
    #[error("Cannot connect with URI '{uri}': {reason}")]
    ConnectionError {
        /// Request target
        uri: String,
        /// Transport failure description
        reason: String,
    },

    /// The exchange failed after a response began
    #[error("Server error ({status}): {message}")]
    ServerError {
        /// Recovered status, 500 if none could be recovered
        status: u16,
        /// Recovered message
        message: String,
    },

    /// A lookup named something that does not exist
    #[error("{kind} '{name}' not defined")]
    UnknownName {
        /// Kind of the missing entity
        kind: NameKind,
        /// The name that was looked up
        name: String,
    },
}

impl RestxError {
    /// Shorthand for a [`RestxError::MalformedSchema`]
    #[must_use]
    pub fn malformed(object: SchemaObject, reason: impl Into<String>) -> Self {
        Self::MalformedSchema {
            object,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`RestxError::UnknownName`]
    #[must_use]
    pub fn unknown(kind: NameKind, name: impl Into<String>) -> Self {
        Self::UnknownName {
            kind,
            name: name.into(),
        }
    }

    /// Check whether the error was raised before any request left the client
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. }
                | Self::TypeMismatch { .. }
                | Self::InvalidMethod { .. }
                | Self::UnknownName { .. }
        )
    }
}
