//! Sample component registered by the server binary.

use restx_component::{
    Component, ComponentSpec, DescriptorCell, HostType, ParamDecl, Reply, ServiceCall, ServiceDecl,
};
use restx_core::{NameKind, RestxError, Result, Value};
use serde_json::json;

/// A component with one parameterized service and one echo service
#[derive(Debug, Default)]
pub struct SampleComponent {
    cell: DescriptorCell,
}

impl SampleComponent {
    /// Create the component
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Component for SampleComponent {
    fn spec(&self) -> ComponentSpec {
        ComponentSpec::new(
            "SampleComponent",
            "A sample component",
            "Shows how parameters, positional arguments and request bodies reach a component.",
        )
        .param(ParamDecl::new("api_key", HostType::Password, "API key for the sample service"))
        .service(
            ServiceDecl::new("foobar", "Reports the query and count it was called with")
                .param(
                    ParamDecl::new("query", HostType::Text, "Query string")
                        .with_default("foo")
                        .positional(),
                )
                .param(
                    ParamDecl::new("num", HostType::Integer, "Number of results")
                        .with_default("10")
                        .positional(),
                ),
        )
        .service(ServiceDecl::new("echo", "Returns the request body"))
    }

    fn descriptor_cell(&self) -> &DescriptorCell {
        &self.cell
    }

    fn call(&self, call: ServiceCall) -> Result<Reply> {
        match call.service.as_str() {
            "foobar" => Ok(Reply::ok(json!({
                "resource": call.resource,
                "query": call.arg("query").cloned().unwrap_or(Value::Null),
                "num": call.arg("num").cloned().unwrap_or(Value::Null),
                "has_key": call.resource_param("api_key").is_some(),
            }))),
            "echo" => Ok(Reply::ok(call.body.unwrap_or(Value::Null))),
            other => Err(RestxError::unknown(NameKind::Service, other)),
        }
    }
}
