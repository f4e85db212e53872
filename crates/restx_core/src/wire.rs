//! Schema wire codec.
//!
//! Maps descriptors to and from the nested JSON shape exchanged between
//! server and client. Decoding is strict: a missing key or a key of the
//! wrong JSON kind is a `MalformedSchema` error naming the object being
//! decoded.

use crate::descriptor::{ComponentDescriptor, ServiceDefinition};
use crate::error::{RestxError, Result, SchemaObject};
use crate::json::{self, Map, Value};
use crate::parameter::ParameterDefinition;
use crate::types::ParameterType;
use indexmap::IndexMap;

/// A decoded component schema together with the URI it was published at
#[derive(Debug, Clone, PartialEq)]
pub struct WireComponent {
    /// The component's descriptor
    pub descriptor: ComponentDescriptor,
    /// Where the component lives on the server
    pub uri: String,
}

/// Wire form of a resource: a named, addressable component instance
#[derive(Debug, Clone, PartialEq)]
pub struct WireResource {
    /// Resource name
    pub name: String,
    /// Resource description
    pub description: String,
    /// Resource URI
    pub uri: String,
    /// Services the resource exposes
    pub services: IndexMap<String, ServiceDefinition>,
}

/// Top-level server metadata published at the document root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerMeta {
    /// Code root URI
    pub code: String,
    /// Documentation URI
    pub doc: String,
    /// Server name
    pub name: String,
    /// Resource root URI
    pub resource: String,
    /// Static file root URI
    pub static_root: String,
    /// Server version
    pub version: String,
}

/// One entry of a component or resource listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Description of the listed item
    pub desc: String,
    /// URI of the listed item
    pub uri: String,
}

/// Keyed view of a JSON object being decoded
struct Fields<'a> {
    object: SchemaObject,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn open(object: SchemaObject, value: &'a Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self { object, map }),
            other => Err(RestxError::malformed(
                object,
                format!("Expected a map, got {}", json::kind_name(other)),
            )),
        }
    }

    fn get(&self, key: &str) -> Result<&'a Value> {
        self.map.get(key).ok_or_else(|| {
            RestxError::malformed(self.object, format!("Missing expected key '{key}'"))
        })
    }

    fn optional(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    fn text(&self, key: &str) -> Result<&'a str> {
        match self.get(key)? {
            Value::String(s) => Ok(s),
            other => Err(self.wrong_kind(key, "string", other)),
        }
    }

    fn map(&self, key: &str) -> Result<&'a Map<String, Value>> {
        match self.get(key)? {
            Value::Object(m) => Ok(m),
            other => Err(self.wrong_kind(key, "map", other)),
        }
    }

    fn wrong_kind(&self, key: &str, expected: &str, got: &Value) -> RestxError {
        RestxError::malformed(
            self.object,
            format!(
                "Key '{key}' should hold a {expected}, got {}",
                json::kind_name(got)
            ),
        )
    }
}

/// Encode one parameter definition
#[must_use]
pub fn encode_parameter(param: &ParameterDefinition) -> Value {
    let mut map = Map::new();
    map.insert("type".into(), Value::String(param.param_type().token().into()));
    map.insert("desc".into(), Value::String(param.description().into()));
    map.insert("required".into(), Value::Bool(param.is_required()));
    map.insert(
        "default".into(),
        param.default_value().cloned().unwrap_or(Value::Null),
    );
    Value::Object(map)
}

/// Decode one parameter definition
///
/// # Errors
///
/// Returns `MalformedSchema` for missing keys, unknown type tokens or an
/// optional parameter whose default does not convert to its type
pub fn decode_parameter(name: &str, value: &Value) -> Result<ParameterDefinition> {
    let fields = Fields::open(SchemaObject::Parameter, value)?;
    let token = fields.text("type")?;
    let param_type = ParameterType::from_token(token).ok_or_else(|| {
        RestxError::malformed(
            SchemaObject::Parameter,
            format!("Unknown type '{token}' for parameter '{name}'"),
        )
    })?;
    let desc = fields.text("desc")?;
    let required_raw = fields.get("required")?;
    let required = match ParameterType::Boolean.convert(Some(required_raw)) {
        Some(Value::Bool(b)) => b,
        _ => return Err(fields.wrong_kind("required", "boolean", required_raw)),
    };
    if required {
        return Ok(ParameterDefinition::required(name, param_type, desc));
    }
    let default = match fields.optional("default") {
        None | Some(Value::Null) => {
            return Err(RestxError::malformed(
                SchemaObject::Parameter,
                format!("Optional parameter '{name}' has no default"),
            ));
        }
        Some(d) => d,
    };
    ParameterDefinition::optional(name, param_type, desc, default).map_err(|e| {
        RestxError::malformed(SchemaObject::Parameter, e.to_string())
    })
}

/// Encode a name to parameter map
#[must_use]
pub fn encode_parameters(params: &IndexMap<String, ParameterDefinition>) -> Value {
    let map = params
        .iter()
        .map(|(name, p)| (name.clone(), encode_parameter(p)))
        .collect();
    Value::Object(map)
}

/// Decode a name to parameter map
///
/// # Errors
///
/// Returns `MalformedSchema` if any parameter fails to decode
pub fn decode_parameters(
    map: &Map<String, Value>,
) -> Result<IndexMap<String, ParameterDefinition>> {
    map.iter()
        .map(|(name, v)| Ok((name.clone(), decode_parameter(name, v)?)))
        .collect()
}

/// Encode one service; its URI is `{owner_uri}/{service name}`
#[must_use]
pub fn encode_service(service: &ServiceDefinition, owner_uri: &str) -> Value {
    let mut map = Map::new();
    map.insert("desc".into(), Value::String(service.description().into()));
    map.insert(
        "uri".into(),
        Value::String(format!("{owner_uri}/{}", service.name())),
    );
    map.insert("params".into(), encode_parameters(service.parameters()));
    if !service.positional().is_empty() {
        let names = service
            .positional()
            .iter()
            .map(|n| Value::String(n.clone()))
            .collect();
        map.insert("positional_params".into(), Value::Array(names));
    }
    Value::Object(map)
}

/// Decode one service, re-validating its positional parameter list
///
/// # Errors
///
/// Returns `MalformedSchema` for missing keys, bad parameters or positional
/// names that the service does not declare
pub fn decode_service(name: &str, value: &Value) -> Result<ServiceDefinition> {
    let fields = Fields::open(SchemaObject::Service, value)?;
    let desc = fields.text("desc")?;
    fields.text("uri")?;
    let mut service = ServiceDefinition::new(name, desc);
    for (_, param) in decode_parameters(fields.map("params")?)? {
        service
            .add_parameter(param)
            .map_err(|e| RestxError::malformed(SchemaObject::Service, e.to_string()))?;
    }
    if let Some(raw) = fields.optional("positional_params") {
        let Value::Array(items) = raw else {
            return Err(fields.wrong_kind("positional_params", "list", raw));
        };
        let names = items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(fields.wrong_kind("positional_params", "list of names", other)),
            })
            .collect::<Result<Vec<_>>>()?;
        service.set_positional(names)?;
    }
    Ok(service)
}

fn encode_services(services: &IndexMap<String, ServiceDefinition>, owner_uri: &str) -> Value {
    let map = services
        .iter()
        .map(|(name, s)| (name.clone(), encode_service(s, owner_uri)))
        .collect();
    Value::Object(map)
}

fn decode_services(map: &Map<String, Value>) -> Result<IndexMap<String, ServiceDefinition>> {
    map.iter()
        .map(|(name, v)| Ok((name.clone(), decode_service(name, v)?)))
        .collect()
}

/// Encode a component descriptor published at `uri`
#[must_use]
pub fn encode_component(descriptor: &ComponentDescriptor, uri: &str) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), Value::String(descriptor.name().into()));
    map.insert("desc".into(), Value::String(descriptor.description().into()));
    map.insert("doc".into(), Value::String(descriptor.doc().into()));
    map.insert("uri".into(), Value::String(uri.into()));
    map.insert("params".into(), encode_parameters(descriptor.parameters()));
    map.insert("services".into(), encode_services(descriptor.services(), uri));
    map.insert(
        "resource_creation_params".into(),
        encode_parameters(descriptor.resource_creation_params()),
    );
    Value::Object(map)
}

/// Decode a component schema
///
/// # Errors
///
/// Returns `MalformedSchema` if the value does not describe a component
pub fn decode_component(value: &Value) -> Result<WireComponent> {
    let fields = Fields::open(SchemaObject::Component, value)?;
    let name = fields.text("name")?;
    let mut descriptor =
        ComponentDescriptor::new(name, fields.text("desc")?, fields.text("doc")?);
    let uri = fields.text("uri")?.to_string();
    let restate = |e: RestxError| RestxError::malformed(SchemaObject::Component, e.to_string());
    for (_, param) in decode_parameters(fields.map("params")?)? {
        descriptor.add_parameter(param).map_err(restate)?;
    }
    for (_, service) in decode_services(fields.map("services")?)? {
        descriptor.add_service(service).map_err(restate)?;
    }
    let creation = decode_parameters(fields.map("resource_creation_params")?)?;
    descriptor.set_resource_creation_params(creation)?;
    Ok(WireComponent { descriptor, uri })
}

/// Encode a resource
#[must_use]
pub fn encode_resource(resource: &WireResource) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), Value::String(resource.name.clone()));
    map.insert("desc".into(), Value::String(resource.description.clone()));
    map.insert("uri".into(), Value::String(resource.uri.clone()));
    map.insert(
        "services".into(),
        encode_services(&resource.services, &resource.uri),
    );
    Value::Object(map)
}

/// Decode a resource
///
/// # Errors
///
/// Returns `MalformedSchema` if the value does not describe a resource
pub fn decode_resource(value: &Value) -> Result<WireResource> {
    let fields = Fields::open(SchemaObject::Resource, value)?;
    Ok(WireResource {
        name: fields.text("name")?.to_string(),
        description: fields.text("desc")?.to_string(),
        uri: fields.text("uri")?.to_string(),
        services: decode_services(fields.map("services")?)?,
    })
}

/// Encode server metadata
#[must_use]
pub fn encode_server_meta(meta: &ServerMeta) -> Value {
    let mut map = Map::new();
    for (key, value) in [
        ("code", &meta.code),
        ("doc", &meta.doc),
        ("name", &meta.name),
        ("resource", &meta.resource),
        ("static", &meta.static_root),
        ("version", &meta.version),
    ] {
        map.insert(key.into(), Value::String(value.clone()));
    }
    Value::Object(map)
}

/// Decode server metadata; all six keys must be present
///
/// # Errors
///
/// Returns `MalformedSchema` on a missing key
pub fn decode_server_meta(value: &Value) -> Result<ServerMeta> {
    let fields = Fields::open(SchemaObject::ServerMeta, value)?;
    Ok(ServerMeta {
        code: fields.text("code")?.to_string(),
        doc: fields.text("doc")?.to_string(),
        name: fields.text("name")?.to_string(),
        resource: fields.text("resource")?.to_string(),
        static_root: fields.text("static")?.to_string(),
        version: fields.text("version")?.to_string(),
    })
}

/// Encode a name to {desc, uri} listing
#[must_use]
pub fn encode_listing(entries: &IndexMap<String, ListingEntry>) -> Value {
    let map = entries
        .iter()
        .map(|(name, e)| {
            let mut m = Map::new();
            m.insert("desc".into(), Value::String(e.desc.clone()));
            m.insert("uri".into(), Value::String(e.uri.clone()));
            (name.clone(), Value::Object(m))
        })
        .collect();
    Value::Object(map)
}

/// Decode a name to {desc, uri} listing
///
/// # Errors
///
/// Returns `MalformedSchema` if an entry lacks `desc` or `uri`
pub fn decode_listing(value: &Value) -> Result<IndexMap<String, ListingEntry>> {
    let Value::Object(map) = value else {
        return Err(RestxError::malformed(
            SchemaObject::Listing,
            format!("Expected a map, got {}", json::kind_name(value)),
        ));
    };
    map.iter()
        .map(|(name, v)| {
            let fields = Fields::open(SchemaObject::Listing, v)?;
            let entry = ListingEntry {
                desc: fields.text("desc")?.to_string(),
                uri: fields.text("uri")?.to_string(),
            };
            Ok((name.clone(), entry))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DESC_PARAM;
    use proptest::prelude::*;
    use serde_json::json;

    fn search_descriptor() -> ComponentDescriptor {
        let mut d = ComponentDescriptor::new("Search", "Web search", "Searches the web");
        d.add_parameter(ParameterDefinition::required(
            "api_key",
            ParameterType::Password,
            "API key",
        ))
        .unwrap();
        let mut s = ServiceDefinition::new("search", "Run a query")
            .with_parameter(ParameterDefinition::required("text", ParameterType::String, "Query"))
            .unwrap()
            .with_parameter(
                ParameterDefinition::optional_from_text("num", ParameterType::Number, "Count", "10")
                    .unwrap(),
            )
            .unwrap();
        s.set_positional(vec!["num".into()]).unwrap();
        d.add_service(s).unwrap();
        d
    }

    #[test]
    fn test_encode_component_shape() {
        let wire = encode_component(&search_descriptor(), "/code/Search");
        assert_eq!(wire["uri"], json!("/code/Search"));
        assert_eq!(wire["params"]["api_key"]["type"], json!("password"));
        assert_eq!(wire["params"]["api_key"]["default"], Value::Null);
        let svc = &wire["services"]["search"];
        assert_eq!(svc["uri"], json!("/code/Search/search"));
        assert_eq!(svc["positional_params"], json!(["num"]));
        assert_eq!(svc["params"]["num"]["default"], json!(10));
        let rcp = wire["resource_creation_params"].as_object().unwrap();
        assert_eq!(rcp.len(), 2);
        assert_eq!(rcp[DESC_PARAM]["default"], json!("A 'Search' resource"));
    }

    #[test]
    fn test_empty_positional_omitted() {
        let s = ServiceDefinition::new("ping", "");
        let wire = encode_service(&s, "/resource/r");
        assert!(wire.get("positional_params").is_none());
    }

    #[test]
    fn test_component_roundtrip() {
        let d = search_descriptor();
        let decoded = decode_component(&encode_component(&d, "/code/Search")).unwrap();
        assert_eq!(decoded.descriptor, d);
        assert_eq!(decoded.uri, "/code/Search");
    }

    #[test]
    fn test_missing_key_names_object() {
        let mut wire = encode_component(&search_descriptor(), "/code/Search");
        wire["services"]["search"]
            .as_object_mut()
            .unwrap()
            .remove("uri");
        let err = decode_component(&wire).unwrap_err();
        assert!(matches!(
            err,
            RestxError::MalformedSchema { object: SchemaObject::Service, ref reason } if reason.contains("'uri'")
        ));
    }

    #[test]
    fn test_unknown_type_token() {
        let err = decode_parameter(
            "when",
            &json!({"type": "date", "desc": "", "required": true}),
        )
        .unwrap_err();
        assert!(matches!(err, RestxError::MalformedSchema { object: SchemaObject::Parameter, .. }));
    }

    #[test]
    fn test_required_accepts_text() {
        let p = decode_parameter(
            "flag",
            &json!({"type": "boolean", "desc": "", "required": "no", "default": "yes"}),
        )
        .unwrap();
        assert!(!p.is_required());
        assert_eq!(p.default_value(), Some(&json!(true)));

        let p = decode_parameter("q", &json!({"type": "string", "desc": "", "required": "YES"}))
            .unwrap();
        assert!(p.is_required());
    }

    #[test]
    fn test_optional_default_must_convert() {
        let bad = json!({"type": "number", "desc": "", "required": false, "default": "many"});
        assert!(decode_parameter("n", &bad).is_err());
        let absent = json!({"type": "number", "desc": "", "required": false});
        assert!(decode_parameter("n", &absent).is_err());
    }

    #[test]
    fn test_positional_revalidated() {
        let wire = json!({
            "desc": "",
            "uri": "/resource/r/s",
            "params": {"a": {"type": "string", "desc": "", "required": true, "default": null}},
            "positional_params": ["a", "b"],
        });
        let err = decode_service("s", &wire).unwrap_err();
        assert!(matches!(err, RestxError::MalformedSchema { object: SchemaObject::Service, .. }));
    }

    #[test]
    fn test_server_meta_requires_all_keys() {
        let meta = ServerMeta {
            code: "/code".into(),
            doc: "/meta/doc".into(),
            name: "RESTx server".into(),
            resource: "/resource".into(),
            static_root: "/static".into(),
            version: "0.1.0".into(),
        };
        let wire = encode_server_meta(&meta);
        assert_eq!(decode_server_meta(&wire).unwrap(), meta);
        for key in ["code", "doc", "name", "resource", "static", "version"] {
            let mut partial = wire.clone();
            partial.as_object_mut().unwrap().remove(key);
            let err = decode_server_meta(&partial).unwrap_err();
            assert!(matches!(err, RestxError::MalformedSchema { object: SchemaObject::ServerMeta, .. }));
        }
    }

    #[test]
    fn test_resource_roundtrip() {
        let d = search_descriptor();
        let resource = WireResource {
            name: "MySearch".into(),
            description: "A search".into(),
            uri: "/resource/MySearch".into(),
            services: d.services().clone(),
        };
        let wire = encode_resource(&resource);
        assert_eq!(wire["services"]["search"]["uri"], json!("/resource/MySearch/search"));
        assert_eq!(decode_resource(&wire).unwrap(), resource);
    }

    #[test]
    fn test_listing() {
        let wire = json!({"Search": {"desc": "Web search", "uri": "/code/Search"}});
        let listing = decode_listing(&wire).unwrap();
        assert_eq!(listing["Search"].uri, "/code/Search");
        assert_eq!(encode_listing(&listing), wire);
        assert!(decode_listing(&json!({"Search": {"desc": ""}})).is_err());
        assert!(decode_listing(&json!([])).is_err());
    }

    #[test]
    fn test_wire_roundtrip_canonical() {
        let wire = encode_component(&search_descriptor(), "/code/Search");
        let decoded = decode_component(&wire).unwrap();
        assert_eq!(encode_component(&decoded.descriptor, &decoded.uri), wire);
    }

    fn param_strategy() -> impl Strategy<Value = (ParameterType, Option<Value>)> {
        prop_oneof![
            (0..5usize).prop_map(|i| (ParameterType::ALL[i], None)),
            "[a-zA-Z ]{0,12}".prop_map(|s| (ParameterType::String, Some(Value::String(s)))),
            "[a-z:/.]{1,12}".prop_map(|s| (ParameterType::Uri, Some(Value::String(s)))),
            any::<bool>().prop_map(|b| (ParameterType::Boolean, Some(Value::Bool(b)))),
            any::<i64>().prop_map(|n| (ParameterType::Number, Some(json!(n)))),
            ("-?[1-9][0-9]{0,20}", "[0-9]{1,20}").prop_map(|(i, f)| {
                let n = ParameterType::Number.convert_text(&format!("{i}.{f}"));
                (ParameterType::Number, n)
            }),
        ]
    }

    fn params_strategy()
    -> impl Strategy<Value = Vec<(String, ParameterType, Option<Value>, bool)>> {
        prop::collection::btree_map("[a-z_]{1,8}", (param_strategy(), any::<bool>()), 0..5)
            .prop_map(|m| {
                m.into_iter()
                    .map(|(name, ((t, d), positional))| (name, t, d, positional))
                    .collect()
            })
    }

    fn build_param(name: &str, t: ParameterType, d: Option<&Value>) -> ParameterDefinition {
        match d {
            Some(d) => ParameterDefinition::optional(name, t, "generated", d).unwrap(),
            None => ParameterDefinition::required(name, t, "generated"),
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_descriptor_roundtrip(
            name in "[A-Z][a-zA-Z]{0,10}",
            creation in params_strategy(),
            services in prop::collection::btree_map("[a-z]{1,8}", params_strategy(), 0..4),
        ) {
            let mut d = ComponentDescriptor::new(name.clone(), "generated", "docs");
            for (pname, t, default, _) in &creation {
                d.add_parameter(build_param(pname, *t, default.as_ref())).unwrap();
            }
            for (sname, params) in &services {
                let mut s = ServiceDefinition::new(sname.clone(), "generated");
                for (pname, t, default, _) in params {
                    s.add_parameter(build_param(pname, *t, default.as_ref())).unwrap();
                }
                let positional = params
                    .iter()
                    .filter(|p| p.3)
                    .map(|p| p.0.clone())
                    .collect();
                s.set_positional(positional).unwrap();
                d.add_service(s).unwrap();
            }
            let uri = format!("/code/{name}");
            let wire = encode_component(&d, &uri);
            let decoded = decode_component(&wire).unwrap();
            prop_assert_eq!(&decoded.descriptor, &d);
            prop_assert_eq!(encode_component(&decoded.descriptor, &decoded.uri), wire);
        }
    }
}
