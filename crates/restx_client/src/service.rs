//! Invocation builder for one service of one resource.

use crate::client::{Client, Response};
use indexmap::IndexMap;
use restx_core::json;
use restx_core::{HttpMethod, RestxError, Result, ServiceDefinition, Value};
use std::sync::Arc;

/// A request assembled from a bound service, ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// Path including the query string
    pub path: String,
    /// Selected method
    pub method: HttpMethod,
    /// Request body
    pub body: Option<Value>,
    /// Status the caller expects, if any
    pub expected: Option<u16>,
}

/// A service bound to a resource, collecting values for one invocation
///
/// Each value passes the parameter's type check when it is set. Sending
/// consumes the builder.
#[derive(Debug, Clone)]
pub struct BoundService {
    client: Client,
    resource_uri: String,
    definition: Arc<ServiceDefinition>,
    pending: IndexMap<String, String>,
    body: Option<Value>,
    method: Option<HttpMethod>,
    expected: Option<u16>,
}

impl BoundService {
    pub(crate) fn new(
        client: Client,
        resource_uri: impl Into<String>,
        definition: Arc<ServiceDefinition>,
    ) -> Self {
        Self {
            client,
            resource_uri: resource_uri.into(),
            definition,
            pending: IndexMap::new(),
            body: None,
            method: None,
            expected: None,
        }
    }

    /// The service's schema
    #[must_use]
    pub fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    /// Service name
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Set a parameter value, replacing any earlier one
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the service has no such parameter and
    /// `TypeMismatch` if the value does not fit its type
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        let value = value.into();
        self.definition.parameter(name)?.sanity_check(&value)?;
        self.pending.insert(name.to_string(), json::render(&value));
        Ok(self)
    }

    /// Set the request body
    #[must_use]
    pub fn input(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Choose the request method
    #[must_use]
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Require the server to answer with `status`
    #[must_use]
    pub fn expect(mut self, status: u16) -> Self {
        self.expected = Some(status);
        self
    }

    /// Rendered values set so far, in the order first set
    #[must_use]
    pub fn pending(&self) -> &IndexMap<String, String> {
        &self.pending
    }

    /// Assemble the request without sending it
    ///
    /// # Errors
    ///
    /// Returns `MissingParameter` if a required parameter has no value and
    /// `InvalidMethod` if the method does not fit the request
    pub fn prepare(&self) -> Result<PreparedRequest> {
        if let Some(missing) = self
            .definition
            .required_parameters()
            .find(|p| !self.pending.contains_key(p.name()))
        {
            return Err(RestxError::MissingParameter {
                name: missing.name().to_string(),
            });
        }
        // Values go out verbatim, without percent-escaping.
        let mut path = format!("{}/{}", self.resource_uri, self.definition.name());
        for (i, (name, value)) in self.pending.iter().enumerate() {
            path.push(if i == 0 { '?' } else { '&' });
            path.push_str(name);
            path.push('=');
            path.push_str(value);
        }
        Ok(PreparedRequest {
            path,
            method: self.select_method()?,
            body: self.body.clone(),
            expected: self.expected,
        })
    }

    fn select_method(&self) -> Result<HttpMethod> {
        let invalid = |method: HttpMethod, reason: &str| RestxError::InvalidMethod {
            method: method.to_string(),
            reason: reason.to_string(),
        };
        match (self.body.is_some(), self.method) {
            (true, None) => Ok(HttpMethod::Post),
            (true, Some(m)) if m.accepts_body() => Ok(m),
            (true, Some(m)) => Err(invalid(m, "a request with a body must be POST or PUT")),
            (false, None) => Ok(HttpMethod::Get),
            (
                false,
                Some(m @ (HttpMethod::Get | HttpMethod::Post | HttpMethod::Put | HttpMethod::Delete)),
            ) => Ok(m),
            (false, Some(m)) => Err(invalid(m, "only GET, POST, PUT and DELETE are supported")),
        }
    }

    /// Send the invocation and decode the reply
    ///
    /// # Errors
    ///
    /// Returns the validation errors of [`BoundService::prepare`] before
    /// anything is sent, then the errors of [`Client::json_send`]
    pub fn access(self) -> Result<Response> {
        let request = self.prepare()?;
        tracing::debug!(service = self.name(), path = %request.path, "invoking service");
        self.client.json_send(
            &request.path,
            request.body.as_ref(),
            Some(request.method),
            request.expected,
            None,
        )
    }
}
