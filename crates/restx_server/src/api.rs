//! API server: routes publishing descriptors and dispatching services.

use crate::error::ApiError;
use crate::store::{ResourceStore, StoredResource};
use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use indexmap::IndexMap;
use restx_component::{Capabilities, ServiceCall, SharedRegistry, resolve_call, resolve_values};
use restx_core::wire::{self, ListingEntry, ServerMeta, WireResource};
use restx_core::{RestxError, SUGGESTED_NAME_PARAM, Settings, Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Shared state of all handlers
#[derive(Clone)]
pub struct AppState {
    /// Server settings
    pub settings: Arc<Settings>,
    /// Published components
    pub registry: Arc<SharedRegistry>,
    /// Created resources
    pub resources: Arc<ResourceStore>,
    /// Capabilities handed to components, if configured
    pub capabilities: Option<Arc<dyn Capabilities>>,
}

impl AppState {
    /// Create state with an empty resource store
    #[must_use]
    pub fn new(settings: Settings, registry: SharedRegistry) -> Self {
        Self {
            settings: Arc::new(settings),
            registry: Arc::new(registry),
            resources: Arc::new(ResourceStore::new()),
            capabilities: None,
        }
    }

    /// Offer capabilities to components
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Arc<dyn Capabilities>) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    fn meta(&self) -> ServerMeta {
        let s = &self.settings;
        ServerMeta {
            code: s.prefix_code.clone(),
            doc: s.meta_doc_uri(),
            name: s.server_name.clone(),
            resource: s.prefix_resource.clone(),
            static_root: s.prefix_static.clone(),
            version: s.version.clone(),
        }
    }
}

/// Build the router for a server state
///
/// The settings are expected to have passed [`Settings::normalize`]; two
/// routes on the same path make axum panic.
#[must_use]
pub fn router(state: AppState) -> Router {
    let s = Arc::clone(&state.settings);
    let mut router = Router::new()
        .route(&s.document_root, get(server_meta))
        .route(&s.prefix_meta, get(server_meta))
        .route(&s.meta_doc_uri(), get(server_doc))
        .route(&s.prefix_code, get(list_components))
        .route(
            &format!("{}/{{name}}", s.prefix_code),
            get(component_schema).post(create_resource),
        )
        .route(&s.prefix_resource, get(list_resources))
        .route(
            &format!("{}/{{name}}", s.prefix_resource),
            get(resource_schema).delete(delete_resource),
        )
        .route(
            &format!("{}/{{name}}/{{*call}}", s.prefix_resource),
            any(dispatch),
        )
        .route(&s.prefix_static, get(static_root))
        .route(&format!("{}/{{*path}}", s.prefix_static), get(static_file));
    if s.document_root != "/" {
        router = router.route(&format!("{}/", s.document_root), get(server_meta));
    }
    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn server_meta(State(state): State<AppState>) -> Json<Value> {
    Json(wire::encode_server_meta(&state.meta()))
}

async fn server_doc(State(state): State<AppState>) -> Json<Value> {
    Json(Value::String(state.settings.doc.clone()))
}

async fn list_components(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut listing = IndexMap::new();
    for name in state.registry.list() {
        let descriptor = state.registry.descriptor(&name)?;
        let entry = ListingEntry {
            desc: descriptor.description().to_string(),
            uri: state.settings.component_uri(&name),
        };
        listing.insert(name, entry);
    }
    Ok(Json(wire::encode_listing(&listing)))
}

async fn component_schema(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let descriptor = state.registry.descriptor(&name)?;
    let uri = state.settings.component_uri(&name);
    Ok(Json(wire::encode_component(&descriptor, &uri)))
}

async fn create_resource(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let descriptor = state.registry.descriptor(&name)?;
    let body = parse_body(&body)?.unwrap_or(Value::Null);
    let params = resolve_values(descriptor.parameters(), &object_field(&body, "params")?)
        .map_err(creation_error)?;
    let creation = resolve_values(
        descriptor.resource_creation_params(),
        &object_field(&body, "resource_creation_params")?,
    )
    .map_err(creation_error)?;
    let resource_name = match creation.get(SUGGESTED_NAME_PARAM) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => {
            return Err(RestxError::MissingParameter {
                name: SUGGESTED_NAME_PARAM.to_string(),
            }
            .into());
        }
    };
    let description = creation
        .get(restx_core::DESC_PARAM)
        .map(json::render)
        .unwrap_or_default();
    state.resources.insert(StoredResource {
        name: resource_name.clone(),
        description,
        component: name.clone(),
        params,
    })?;
    let uri = state.settings.resource_uri(&resource_name);
    tracing::info!(component = %name, resource = %resource_name, "created resource");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "created",
            "name": resource_name,
            "uri": uri,
        })),
    ))
}

async fn list_resources(State(state): State<AppState>) -> Json<Value> {
    let listing: IndexMap<String, ListingEntry> = state
        .resources
        .list()
        .into_iter()
        .map(|r| {
            let entry = ListingEntry {
                desc: r.description,
                uri: state.settings.resource_uri(&r.name),
            };
            (r.name, entry)
        })
        .collect();
    Json(wire::encode_listing(&listing))
}

async fn resource_schema(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let resource = state.resources.get(&name)?;
    let descriptor = state.registry.descriptor(&resource.component)?;
    let wire_resource = WireResource {
        uri: state.settings.resource_uri(&resource.name),
        name: resource.name,
        description: resource.description,
        services: descriptor.services().clone(),
    };
    Ok(Json(wire::encode_resource(&wire_resource)))
}

async fn delete_resource(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let removed = state.resources.remove(&name)?;
    tracing::info!(resource = %removed.name, "deleted resource");
    Ok(Json(Value::String(format!(
        "Resource '{}' deleted",
        removed.name
    ))))
}

async fn dispatch(
    State(state): State<AppState>,
    Path((name, call)): Path<(String, String)>,
    Query(query): Query<IndexMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let resource = state.resources.get(&name)?;
    let component = state.registry.get(&resource.component)?;
    let descriptor = component.descriptor()?;
    let mut segments = call.split('/').filter(|s| !s.is_empty()).map(str::to_string);
    let service_name = segments.next().unwrap_or_default();
    let service = descriptor.service(&service_name)?;
    let positional: Vec<String> = segments.collect();
    let args = resolve_call(service, &query, &positional)?;
    tracing::debug!(resource = %name, service = %service_name, "dispatching service call");
    let reply = component.call(ServiceCall {
        service: service_name,
        resource: resource.name,
        resource_params: resource.params,
        args,
        body: call_input(&headers, &body)?,
        capabilities: state.capabilities.clone(),
    })?;
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, Json(reply.body)))
}

/// The input of a service call: decoded JSON for a JSON content type,
/// otherwise the body text as a string
fn call_input(headers: &HeaderMap, body: &Bytes) -> ApiResult<Option<Value>> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    if is_json {
        return parse_body(body);
    }
    if body.is_empty() {
        return Ok(None);
    }
    std::str::from_utf8(body)
        .map(|text| Some(Value::String(text.to_string())))
        .map_err(|e| ApiError::BadBody(e.to_string()))
}

fn parse_body(body: &Bytes) -> ApiResult<Option<Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let text = std::str::from_utf8(body).map_err(|e| ApiError::BadBody(e.to_string()))?;
    json::from_text(text)
        .map(Some)
        .map_err(|e| ApiError::BadBody(e.to_string()))
}

/// Names in a creation body that the component does not declare are a
/// malformed request, not a missing route
fn creation_error(err: RestxError) -> ApiError {
    match err {
        RestxError::UnknownName { .. } => ApiError::BadBody(err.to_string()),
        other => other.into(),
    }
}

async fn static_root() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

async fn static_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    if path.contains("..") {
        return Err(ApiError::InvalidPath(path));
    }
    let relative = path.trim_end_matches('/');
    let file = state.settings.static_dir.join(relative);
    let data = tokio::fs::read(&file).await.map_err(|e| {
        tracing::debug!(file = %file.display(), error = %e, "static file not served");
        ApiError::NotFound("Not found".to_string())
    })?;
    let mime = mime_guess::from_path(relative).first_or_octet_stream();
    Ok(([(CONTENT_TYPE, mime.to_string())], data).into_response())
}

fn object_field(body: &Value, key: &str) -> ApiResult<IndexMap<String, Value>> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(IndexMap::new()),
        Some(Value::Object(map)) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Some(_) => Err(ApiError::BadBody(format!("'{key}' must be a map"))),
    }
}

/// HTTP server for a set of components
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Create a server
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// The server's router
    #[must_use]
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Bind to the configured address and serve until the process ends
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be bound or serving fails
    pub async fn serve(self) -> std::io::Result<()> {
        let addr = self.state.settings.listen_address;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(
            %addr,
            name = %self.state.settings.server_name,
            components = self.state.registry.list().len(),
            "RESTx server listening"
        );
        axum::serve(listener, self.router()).await
    }
}
