//! Resolution of call arguments against a parameter map.

use indexmap::IndexMap;
use restx_core::{
    NameKind, ParameterDefinition, RestxError, Result, ServiceDefinition, Value,
};

/// Resolve supplied values against declared parameters
///
/// Each supplied value is converted to its parameter's type. Optional
/// parameters that were not supplied take their default.
///
/// # Errors
///
/// Returns `UnknownName` for undeclared names, `TypeMismatch` for values
/// that do not convert and `MissingParameter` for absent required ones
pub fn resolve_values(
    params: &IndexMap<String, ParameterDefinition>,
    supplied: &IndexMap<String, Value>,
) -> Result<IndexMap<String, Value>> {
    if let Some(unknown) = supplied.keys().find(|k| !params.contains_key(*k)) {
        return Err(RestxError::unknown(NameKind::Parameter, unknown.as_str()));
    }
    let mut resolved = IndexMap::with_capacity(params.len());
    for (name, param) in params {
        let value = match (supplied.get(name), param.default_value()) {
            (Some(raw), _) => param.convert(Some(raw))?,
            (None, Some(default)) => default.clone(),
            (None, None) => {
                return Err(RestxError::MissingParameter { name: name.clone() });
            }
        };
        resolved.insert(name.clone(), value);
    }
    Ok(resolved)
}

/// Resolve a service call's arguments from its query and extra path segments
///
/// Query values are taken by name. Path segments fill the positional
/// parameters in order; a positional parameter also named
/// in the query keeps the query value. Segments past the last positional
/// parameter are ignored.
///
/// # Errors
///
/// Returns `UnknownName` for undeclared query names, plus the errors of
/// [`resolve_values`]
pub fn resolve_call(
    service: &ServiceDefinition,
    query: &IndexMap<String, String>,
    segments: &[String],
) -> Result<IndexMap<String, Value>> {
    let mut supplied: IndexMap<String, Value> = query
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    for (name, segment) in service.positional().iter().zip(segments) {
        supplied
            .entry(name.clone())
            .or_insert_with(|| Value::String(segment.clone()));
    }
    resolve_values(service.parameters(), &supplied)
}
