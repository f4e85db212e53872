//! Builds descriptors from registration tables.

use crate::declare::{ComponentSpec, ParamDecl, ServiceDecl};
use restx_core::{
    ComponentDescriptor, ParameterDefinition, RestxError, Result, SchemaObject, ServiceDefinition,
};

/// Build a component descriptor from its registration table
///
/// Parameters whose host type has no mapping are left out with a warning.
///
/// # Errors
///
/// Returns error if a default does not convert, a required flag contradicts
/// the default, or a name is declared twice. Nothing is built on failure.
pub fn build_descriptor(spec: &ComponentSpec) -> Result<ComponentDescriptor> {
    let mut descriptor = ComponentDescriptor::new(&spec.name, &spec.description, &spec.doc);
    for decl in &spec.params {
        if let Some(param) = build_parameter(&spec.name, "resource creation", decl)? {
            descriptor.add_parameter(param)?;
        }
    }
    for service in &spec.services {
        descriptor.add_service(build_service(&spec.name, service)?)?;
    }
    tracing::debug!(
        component = %spec.name,
        params = descriptor.parameters().len(),
        services = descriptor.services().len(),
        "built descriptor"
    );
    Ok(descriptor)
}

fn build_service(component: &str, decl: &ServiceDecl) -> Result<ServiceDefinition> {
    let mut service = ServiceDefinition::new(&decl.name, &decl.description);
    let mut positional = Vec::new();
    for param_decl in &decl.params {
        let Some(param) = build_parameter(component, &decl.name, param_decl)? else {
            continue;
        };
        if param_decl.positional {
            positional.push(param.name().to_string());
        }
        service.add_parameter(param)?;
    }
    service.set_positional(positional)?;
    Ok(service)
}

fn build_parameter(
    component: &str,
    scope: &str,
    decl: &ParamDecl,
) -> Result<Option<ParameterDefinition>> {
    let Some(param_type) = decl.host_type.parameter_type() else {
        tracing::warn!(
            component,
            scope,
            parameter = %decl.name,
            host_type = ?decl.host_type,
            "dropping parameter with unmapped host type"
        );
        return Ok(None);
    };
    match (&decl.default, decl.required) {
        (Some(_), Some(true)) => Err(RestxError::malformed(
            SchemaObject::Parameter,
            format!("Required parameter '{}' cannot have a default", decl.name),
        )),
        (None, Some(false)) => Err(RestxError::malformed(
            SchemaObject::Parameter,
            format!("Optional parameter '{}' needs a default", decl.name),
        )),
        (Some(default), _) => ParameterDefinition::optional_from_text(
            &decl.name,
            param_type,
            &decl.description,
            default,
        )
        .map(Some),
        (None, _) => Ok(Some(ParameterDefinition::required(
            &decl.name,
            param_type,
            &decl.description,
        ))),
    }
}
