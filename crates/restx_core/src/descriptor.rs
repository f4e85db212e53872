//! Descriptor data model: services and components.

use crate::error::{NameKind, RestxError, Result, SchemaObject};
use crate::json::Value;
use crate::parameter::ParameterDefinition;
use crate::types::ParameterType;
use indexmap::IndexMap;

/// Name of the implicit resource creation parameter suggesting a name
pub const SUGGESTED_NAME_PARAM: &str = "suggested_name";

/// Name of the implicit resource creation parameter holding a description
pub const DESC_PARAM: &str = "desc";

/// Definition of one service (operation) of a capability surface
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    name: String,
    description: String,
    parameters: IndexMap<String, ParameterDefinition>,
    positional: Vec<String>,
}

impl ServiceDefinition {
    /// Create a service without parameters
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: IndexMap::new(),
            positional: Vec::new(),
        }
    }

    /// Add a parameter
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if a parameter with that name exists
    pub fn add_parameter(&mut self, param: ParameterDefinition) -> Result<()> {
        insert_unique(&mut self.parameters, param)
    }

    /// Add a parameter, builder style
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if a parameter with that name exists
    pub fn with_parameter(mut self, param: ParameterDefinition) -> Result<Self> {
        self.add_parameter(param)?;
        Ok(self)
    }

    /// Set the positional parameter order
    ///
    /// # Errors
    ///
    /// Returns `MalformedSchema` if a name is not a declared parameter
    pub fn set_positional(&mut self, names: Vec<String>) -> Result<()> {
        if let Some(missing) = names.iter().find(|n| !self.parameters.contains_key(*n)) {
            return Err(RestxError::malformed(
                SchemaObject::Service,
                format!(
                    "Parameter '{}' from positionals of service '{}' does not exist",
                    missing, self.name
                ),
            ));
        }
        self.positional = names;
        Ok(())
    }

    /// Service name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// All parameters, in declaration order
    #[must_use]
    pub fn parameters(&self) -> &IndexMap<String, ParameterDefinition> {
        &self.parameters
    }

    /// Look up one parameter
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the service has no such parameter
    pub fn parameter(&self, name: &str) -> Result<&ParameterDefinition> {
        self.parameters
            .get(name)
            .ok_or_else(|| RestxError::unknown(NameKind::Parameter, name))
    }

    /// Names of positional parameters, in path order
    #[must_use]
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Parameters that must be supplied by the caller
    pub fn required_parameters(&self) -> impl Iterator<Item = &ParameterDefinition> {
        self.parameters.values().filter(|p| p.is_required())
    }
}

/// Normalized schema of one component's capability surface
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDescriptor {
    name: String,
    description: String,
    doc: String,
    parameters: IndexMap<String, ParameterDefinition>,
    resource_creation_params: IndexMap<String, ParameterDefinition>,
    services: IndexMap<String, ServiceDefinition>,
}

impl ComponentDescriptor {
    /// Create a descriptor with only the implicit creation parameters
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        doc: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let resource_creation_params = implicit_creation_params(&name);
        Self {
            name,
            description: description.into(),
            doc: doc.into(),
            parameters: IndexMap::new(),
            resource_creation_params,
            services: IndexMap::new(),
        }
    }

    /// Add a resource creation parameter
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if a parameter with that name exists
    pub fn add_parameter(&mut self, param: ParameterDefinition) -> Result<()> {
        insert_unique(&mut self.parameters, param)
    }

    /// Add a service
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if a service with that name exists
    pub fn add_service(&mut self, service: ServiceDefinition) -> Result<()> {
        if self.services.contains_key(service.name()) {
            return Err(RestxError::DuplicateName {
                kind: NameKind::Service,
                name: service.name().to_string(),
            });
        }
        self.services.insert(service.name().to_string(), service);
        Ok(())
    }

    /// Replace the two implicit creation parameters with decoded ones
    ///
    /// # Errors
    ///
    /// Returns `MalformedSchema` unless exactly `suggested_name` and `desc`
    /// are given
    pub fn set_resource_creation_params(
        &mut self,
        params: IndexMap<String, ParameterDefinition>,
    ) -> Result<()> {
        let exact = params.len() == 2
            && params.contains_key(SUGGESTED_NAME_PARAM)
            && params.contains_key(DESC_PARAM);
        if !exact {
            let keys: Vec<&str> = params.keys().map(String::as_str).collect();
            return Err(RestxError::malformed(
                SchemaObject::Component,
                format!(
                    "Resource creation parameters must be exactly '{SUGGESTED_NAME_PARAM}' and '{DESC_PARAM}', got {keys:?}"
                ),
            ));
        }
        self.resource_creation_params = params;
        Ok(())
    }

    /// Component name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Longer documentation
    #[must_use]
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Declared resource creation parameters
    #[must_use]
    pub fn parameters(&self) -> &IndexMap<String, ParameterDefinition> {
        &self.parameters
    }

    /// Look up a declared creation parameter
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if there is no such parameter
    pub fn parameter(&self, name: &str) -> Result<&ParameterDefinition> {
        self.parameters
            .get(name)
            .ok_or_else(|| RestxError::unknown(NameKind::Parameter, name))
    }

    /// The implicit `suggested_name` and `desc` parameters
    #[must_use]
    pub fn resource_creation_params(&self) -> &IndexMap<String, ParameterDefinition> {
        &self.resource_creation_params
    }

    /// All services, in declaration order
    #[must_use]
    pub fn services(&self) -> &IndexMap<String, ServiceDefinition> {
        &self.services
    }

    /// Look up one service
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if there is no such service
    pub fn service(&self, name: &str) -> Result<&ServiceDefinition> {
        self.services
            .get(name)
            .ok_or_else(|| RestxError::unknown(NameKind::Service, name))
    }
}

/// Build the two creation parameters every component carries
#[must_use]
pub fn implicit_creation_params(component_name: &str) -> IndexMap<String, ParameterDefinition> {
    let mut params = IndexMap::new();
    params.insert(
        SUGGESTED_NAME_PARAM.to_string(),
        ParameterDefinition::required(
            SUGGESTED_NAME_PARAM,
            ParameterType::String,
            "Can be used to suggest the resource name to the server",
        ),
    );
    let default = Value::String(format!("A '{component_name}' resource"));
    // Text into a string parameter always converts.
    if let Ok(desc) = ParameterDefinition::optional(
        DESC_PARAM,
        ParameterType::String,
        "Specifies a description for this new resource",
        &default,
    ) {
        params.insert(DESC_PARAM.to_string(), desc);
    }
    params
}

fn insert_unique(
    map: &mut IndexMap<String, ParameterDefinition>,
    param: ParameterDefinition,
) -> Result<()> {
    if map.contains_key(param.name()) {
        return Err(RestxError::DuplicateName {
            kind: NameKind::Parameter,
            name: param.name().to_string(),
        });
    }
    map.insert(param.name().to_string(), param);
    Ok(())
}
