//! The client talking to the real router through an in-process transport.

use axum::Router;
use axum::body::{Body, to_bytes};
use restx_client::{Client, HttpReply, HttpRequest, Transport, TransportError};
use restx_component::SharedRegistry;
use restx_core::{HttpMethod, RestxError, Settings};
use restx_server::{AppState, SampleComponent, router};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

struct RouterTransport {
    app: Router,
    runtime: tokio::runtime::Runtime,
}

impl Transport for RouterTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(request.path.as_str());
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        let body = request.body.clone().map_or_else(Body::empty, Body::from);
        let http_request = builder
            .body(body)
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        self.runtime.block_on(async {
            let response = self
                .app
                .clone()
                .oneshot(http_request)
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            let status = response.status().as_u16();
            let bytes = to_bytes(response.into_body(), usize::MAX)
                .await
                .map_err(|e| TransportError::Interrupted {
                    status: Some(status),
                    message: e.to_string(),
                })?;
            Ok(HttpReply::new(status, String::from_utf8_lossy(&bytes)))
        })
    }
}

fn client() -> Client {
    let registry = SharedRegistry::new();
    registry.register(Arc::new(SampleComponent::new())).unwrap();
    let transport = RouterTransport {
        app: router(AppState::new(Settings::default(), registry)),
        runtime: tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap(),
    };
    Client::with_transport(Arc::new(transport), "")
}

#[test]
fn test_full_cycle() {
    let client = client();
    assert_eq!(client.server_name().unwrap(), "RESTx server");
    assert_eq!(client.component_names().unwrap(), vec!["SampleComponent"]);

    let component = client.component("SampleComponent").unwrap();
    assert_eq!(component.descriptor().resource_creation_params().len(), 2);

    let resource = component
        .resource_template()
        .set("api_key", "secret")
        .unwrap()
        .suggested_name("Mine")
        .create()
        .unwrap();
    assert_eq!(resource.uri(), "/resource/Mine");
    assert_eq!(client.resource_names().unwrap(), vec!["Mine"]);

    let reply = resource
        .service("foobar")
        .unwrap()
        .set("num", 4)
        .unwrap()
        .expect(200)
        .access()
        .unwrap();
    assert_eq!(reply.body["num"], json!(4));
    assert_eq!(reply.body["query"], json!("foo"));

    let echoed = resource
        .service("echo")
        .unwrap()
        .input(json!({"hello": "world"}))
        .method(HttpMethod::Put)
        .access()
        .unwrap();
    assert_eq!(echoed.body, json!({"hello": "world"}));

    resource.delete().unwrap();
    assert!(matches!(
        client.resource("Mine"),
        Err(RestxError::UnknownName { .. })
    ));
}

#[test]
fn test_duplicate_resource_is_unexpected_status() {
    let client = client();
    let component = client.component("SampleComponent").unwrap();
    let template = component
        .resource_template()
        .set("api_key", "k")
        .unwrap()
        .suggested_name("Twice");
    template.clone().create().unwrap();
    assert!(matches!(
        template.create(),
        Err(RestxError::UnexpectedStatus { expected: 201, actual: 409, .. })
    ));
}
