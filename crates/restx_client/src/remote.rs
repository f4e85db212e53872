//! Client-side mirrors of components and resources.

use crate::client::Client;
use crate::service::BoundService;
use indexmap::IndexMap;
use restx_core::wire::{WireComponent, WireResource};
use restx_core::{
    ComponentDescriptor, DESC_PARAM, HttpMethod, NameKind, ParameterDefinition, RestxError, Result,
    SUGGESTED_NAME_PARAM, ServiceDefinition, Value,
};
use std::sync::Arc;

/// A component schema fetched from the server
#[derive(Debug, Clone)]
pub struct RemoteComponent {
    client: Client,
    wire: Arc<WireComponent>,
}

impl RemoteComponent {
    pub(crate) fn new(client: Client, wire: Arc<WireComponent>) -> Self {
        Self { client, wire }
    }

    /// The decoded descriptor
    #[must_use]
    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.wire.descriptor
    }

    /// Component name
    #[must_use]
    pub fn name(&self) -> &str {
        self.wire.descriptor.name()
    }

    /// Short description
    #[must_use]
    pub fn description(&self) -> &str {
        self.wire.descriptor.description()
    }

    /// Documentation text
    #[must_use]
    pub fn doc(&self) -> &str {
        self.wire.descriptor.doc()
    }

    /// Component URI
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.wire.uri
    }

    /// Resource creation parameters
    #[must_use]
    pub fn parameters(&self) -> &IndexMap<String, ParameterDefinition> {
        self.wire.descriptor.parameters()
    }

    /// Services every resource of this component offers
    #[must_use]
    pub fn services(&self) -> &IndexMap<String, ServiceDefinition> {
        self.wire.descriptor.services()
    }

    /// Start assembling a new resource of this component
    #[must_use]
    pub fn resource_template(&self) -> ResourceTemplate {
        ResourceTemplate {
            client: self.client.clone(),
            component_uri: self.wire.uri.clone(),
            parameters: self.wire.descriptor.parameters().clone(),
            values: IndexMap::new(),
            suggested_name: None,
            description: None,
        }
    }
}

/// A concrete resource on the server
#[derive(Debug, Clone)]
pub struct RemoteResource {
    client: Client,
    name: String,
    description: String,
    uri: String,
    services: IndexMap<String, Arc<ServiceDefinition>>,
}

impl RemoteResource {
    pub(crate) fn new(client: Client, wire: WireResource) -> Self {
        Self {
            client,
            name: wire.name,
            description: wire.description,
            uri: wire.uri,
            services: wire
                .services
                .into_iter()
                .map(|(name, s)| (name, Arc::new(s)))
                .collect(),
        }
    }

    /// Resource name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resource description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Resource URI
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Names of the resource's services
    #[must_use]
    pub fn service_names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    /// Schema of one service
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the resource has no such service
    pub fn service_definition(&self, name: &str) -> Result<&ServiceDefinition> {
        self.services
            .get(name)
            .map(|s| &**s)
            .ok_or_else(|| RestxError::unknown(NameKind::Service, name))
    }

    /// A fresh invocation builder for one service
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the resource has no such service
    pub fn service(&self, name: &str) -> Result<BoundService> {
        let definition = self
            .services
            .get(name)
            .ok_or_else(|| RestxError::unknown(NameKind::Service, name))?;
        Ok(BoundService::new(
            self.client.clone(),
            self.uri.clone(),
            Arc::clone(definition),
        ))
    }

    /// Delete the resource on the server
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedStatus` unless the server answers `200`
    pub fn delete(self) -> Result<()> {
        tracing::debug!(resource = %self.name, "deleting resource");
        self.client
            .json_send(&self.uri, None, Some(HttpMethod::Delete), Some(200), None)
            .map(|_| ())
    }
}

/// Parameter values for a resource about to be created
#[derive(Debug, Clone)]
pub struct ResourceTemplate {
    client: Client,
    component_uri: String,
    parameters: IndexMap<String, ParameterDefinition>,
    values: IndexMap<String, Value>,
    suggested_name: Option<String>,
    description: Option<String>,
}

impl ResourceTemplate {
    /// Set a creation parameter value
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` for an undeclared parameter and `TypeMismatch`
    /// if the value does not fit its type
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        let param = self
            .parameters
            .get(name)
            .ok_or_else(|| RestxError::unknown(NameKind::Parameter, name))?;
        let converted = param.convert(Some(&value.into()))?;
        self.values.insert(name.to_string(), converted);
        Ok(self)
    }

    /// Suggest a name for the new resource
    #[must_use]
    pub fn suggested_name(mut self, name: impl Into<String>) -> Self {
        self.suggested_name = Some(name.into());
        self
    }

    /// Describe the new resource
    #[must_use]
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// The request body `create` would send
    ///
    /// # Errors
    ///
    /// Returns `MissingParameter` if a required value or the suggested name
    /// is absent
    pub fn body(&self) -> Result<Value> {
        if let Some(missing) = self
            .parameters
            .values()
            .find(|p| p.is_required() && !self.values.contains_key(p.name()))
        {
            return Err(RestxError::MissingParameter {
                name: missing.name().to_string(),
            });
        }
        let suggested = self
            .suggested_name
            .clone()
            .ok_or_else(|| RestxError::MissingParameter {
                name: SUGGESTED_NAME_PARAM.to_string(),
            })?;
        let mut creation = serde_json::Map::new();
        creation.insert(SUGGESTED_NAME_PARAM.into(), Value::String(suggested));
        if let Some(desc) = &self.description {
            creation.insert(DESC_PARAM.into(), Value::String(desc.clone()));
        }
        let params = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut body = serde_json::Map::new();
        body.insert("params".into(), Value::Object(params));
        body.insert("resource_creation_params".into(), Value::Object(creation));
        Ok(Value::Object(body))
    }

    /// Create the resource and fetch it
    ///
    /// # Errors
    ///
    /// Returns `MissingParameter` before sending anything, `UnexpectedStatus`
    /// unless the server answers `201` and `ServerError` if the reply does
    /// not confirm the creation
    pub fn create(self) -> Result<RemoteResource> {
        let body = self.body()?;
        let response = self.client.json_send(
            &self.component_uri,
            Some(&body),
            Some(HttpMethod::Post),
            Some(201),
            None,
        )?;
        let reply = &response.body;
        if reply.get("status").and_then(Value::as_str) != Some("created") {
            return Err(RestxError::ServerError {
                status: response.status,
                message: format!("Resource creation was not confirmed: {reply}"),
            });
        }
        let name = reply
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RestxError::ServerError {
                status: response.status,
                message: "Creation reply carries no resource name".to_string(),
            })?;
        tracing::debug!(resource = name, "created resource");
        match reply.get("uri").and_then(Value::as_str) {
            Some(uri) => self.client.resource_at(uri, name),
            None => self.client.resource(name),
        }
    }
}
