//! Client session and schema cache.

use crate::remote::{RemoteComponent, RemoteResource};
use crate::transport::{DEFAULT_TIMEOUT, HttpRequest, HttpTransport, Transport, TransportError};
use indexmap::IndexMap;
use restx_core::json;
use restx_core::wire::{self, ListingEntry, ServerMeta, WireComponent};
use restx_core::{HttpMethod, NameKind, RestxError, Result, Value};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Decoded response of a JSON exchange
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: u16,
    /// Decoded body; `null` for an empty body
    pub body: Value,
}

struct Shared {
    transport: Arc<dyn Transport>,
    doc_root: String,
    meta: RwLock<Option<ServerMeta>>,
    docs: RwLock<Option<Value>>,
    components: RwLock<Option<IndexMap<String, ListingEntry>>>,
    schemas: RwLock<IndexMap<String, Arc<WireComponent>>>,
}

/// A session with one RESTx server
///
/// Server metadata, docs, the component listing and component schemas are
/// fetched on first use and cached for the session. Cloning shares the
/// cache.
#[derive(Clone)]
pub struct Client {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("doc_root", &self.shared.doc_root)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Connect to a server URI such as `http://localhost:8001`
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the URI is not a usable server URI
    pub fn connect(server_uri: &str) -> Result<Self> {
        Self::connect_with_timeout(server_uri, DEFAULT_TIMEOUT)
    }

    /// Connect with an explicit request timeout
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the URI is not a usable server URI
    pub fn connect_with_timeout(server_uri: &str, timeout: Duration) -> Result<Self> {
        let (base, doc_root) = split_server_uri(server_uri)?;
        let transport = HttpTransport::new(base, timeout).map_err(|e| {
            RestxError::ConnectionError {
                uri: server_uri.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self::with_transport(Arc::new(transport), &doc_root))
    }

    /// Create a session over any transport
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>, doc_root: &str) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                doc_root: doc_root.trim_end_matches('/').to_string(),
                meta: RwLock::new(None),
                docs: RwLock::new(None),
                components: RwLock::new(None),
                schemas: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Document root path, without trailing slash
    #[must_use]
    pub fn doc_root(&self) -> &str {
        &self.shared.doc_root
    }

    /// Send a JSON request
    ///
    /// Without a method, requests with a body are POSTs and others GETs.
    /// The JSON `Accept` header is always sent and overrides a caller's.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if no response was obtained,
    /// `UnexpectedStatus` if `expected` is given and differs, and
    /// `ServerError` for broken responses
    pub fn json_send(
        &self,
        path: &str,
        body: Option<&Value>,
        method: Option<HttpMethod>,
        expected: Option<u16>,
        headers: Option<&IndexMap<String, String>>,
    ) -> Result<Response> {
        let method = method.unwrap_or(if body.is_some() {
            HttpMethod::Post
        } else {
            HttpMethod::Get
        });
        let mut all_headers = headers.cloned().unwrap_or_default();
        all_headers.insert("Accept".into(), "application/json".into());
        if body.is_some() {
            all_headers.insert("Content-Type".into(), "application/json".into());
        }
        let request = HttpRequest {
            method,
            path: path.to_string(),
            headers: all_headers,
            body: body.map(json::to_text),
        };
        tracing::debug!(%method, path, "dispatching");
        let reply = match self.shared.transport.send(&request) {
            Ok(reply) => reply,
            Err(TransportError::Connect(reason)) => {
                return Err(RestxError::ConnectionError {
                    uri: path.to_string(),
                    reason,
                });
            }
            Err(TransportError::Interrupted { status, message }) => {
                let actual = status.unwrap_or(500);
                return Err(match expected {
                    Some(expected) if expected != actual => RestxError::UnexpectedStatus {
                        expected,
                        actual,
                        uri: path.to_string(),
                    },
                    _ => RestxError::ServerError {
                        status: actual,
                        message,
                    },
                });
            }
        };
        let status_error = expected
            .filter(|e| *e != reply.status)
            .map(|expected| RestxError::UnexpectedStatus {
                expected,
                actual: reply.status,
                uri: path.to_string(),
            });
        let body = match json::from_text(&reply.body) {
            Ok(body) => body,
            Err(e) => {
                return Err(status_error.unwrap_or(RestxError::ServerError {
                    status: reply.status,
                    message: format!("Response is not valid JSON: {e}"),
                }));
            }
        };
        if let Some(err) = status_error {
            return Err(err);
        }
        Ok(Response {
            status: reply.status,
            body,
        })
    }

    /// GET a path expecting `200`, returning the decoded body
    fn fetch(&self, path: &str) -> Result<Value> {
        self.json_send(path, None, None, Some(200), None)
            .map(|r| r.body)
    }

    /// Server metadata, fetched from the document root once
    ///
    /// # Errors
    ///
    /// Returns error if the fetch fails or a metadata key is missing
    pub fn server_meta(&self) -> Result<ServerMeta> {
        if let Some(meta) = read(&self.shared.meta).clone() {
            return Ok(meta);
        }
        let root = format!("{}/", self.shared.doc_root);
        tracing::debug!(path = %root, "fetching server meta data");
        let meta = wire::decode_server_meta(&self.fetch(&root)?)?;
        *write(&self.shared.meta) = Some(meta.clone());
        Ok(meta)
    }

    /// Server name
    ///
    /// # Errors
    ///
    /// Returns error if the server metadata cannot be fetched
    pub fn server_name(&self) -> Result<String> {
        self.server_meta().map(|m| m.name)
    }

    /// Server version
    ///
    /// # Errors
    ///
    /// Returns error if the server metadata cannot be fetched
    pub fn server_version(&self) -> Result<String> {
        self.server_meta().map(|m| m.version)
    }

    /// Server documentation, fetched once
    ///
    /// # Errors
    ///
    /// Returns error if the fetch fails
    pub fn docs(&self) -> Result<Value> {
        if let Some(docs) = read(&self.shared.docs).clone() {
            return Ok(docs);
        }
        let meta = self.server_meta()?;
        let docs = self.fetch(&meta.doc)?;
        *write(&self.shared.docs) = Some(docs.clone());
        Ok(docs)
    }

    /// Component listing, fetched once
    ///
    /// # Errors
    ///
    /// Returns error if the fetch fails or the listing is malformed
    pub fn components(&self) -> Result<IndexMap<String, ListingEntry>> {
        if let Some(listing) = read(&self.shared.components).clone() {
            return Ok(listing);
        }
        let meta = self.server_meta()?;
        let listing = wire::decode_listing(&self.fetch(&meta.code)?)?;
        *write(&self.shared.components) = Some(listing.clone());
        Ok(listing)
    }

    /// Names of all components
    ///
    /// # Errors
    ///
    /// Returns error if the listing cannot be fetched
    pub fn component_names(&self) -> Result<Vec<String>> {
        Ok(self.components()?.into_keys().collect())
    }

    /// A component's schema, fetched once per name
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the server has no such component, or a
    /// fetch or decode error
    pub fn component(&self, name: &str) -> Result<RemoteComponent> {
        if let Some(wire) = read(&self.shared.schemas).get(name) {
            return Ok(RemoteComponent::new(self.clone(), Arc::clone(wire)));
        }
        let meta = self.server_meta()?;
        let path = format!("{}/{name}", meta.code);
        tracing::debug!(component = name, %path, "fetching component schema");
        let wire = Arc::new(wire::decode_component(&self.fetch_named(
            &path,
            NameKind::Component,
            name,
        )?)?);
        write(&self.shared.schemas).insert(name.to_string(), Arc::clone(&wire));
        Ok(RemoteComponent::new(self.clone(), wire))
    }

    /// Resource listing, fetched on every call
    ///
    /// # Errors
    ///
    /// Returns error if the fetch fails or the listing is malformed
    pub fn resources(&self) -> Result<IndexMap<String, ListingEntry>> {
        let meta = self.server_meta()?;
        wire::decode_listing(&self.fetch(&meta.resource)?)
    }

    /// Names of all resources
    ///
    /// # Errors
    ///
    /// Returns error if the listing cannot be fetched
    pub fn resource_names(&self) -> Result<Vec<String>> {
        Ok(self.resources()?.into_keys().collect())
    }

    /// A resource by name
    ///
    /// # Errors
    ///
    /// Returns `UnknownName` if the server has no such resource, or a fetch
    /// or decode error
    pub fn resource(&self, name: &str) -> Result<RemoteResource> {
        let meta = self.server_meta()?;
        self.resource_at(&format!("{}/{name}", meta.resource), name)
    }

    /// A resource by URI
    pub(crate) fn resource_at(&self, uri: &str, name: &str) -> Result<RemoteResource> {
        tracing::debug!(resource = name, uri, "fetching resource");
        let value = self.fetch_named(uri, NameKind::Resource, name)?;
        Ok(RemoteResource::new(
            self.clone(),
            wire::decode_resource(&value)?,
        ))
    }

    fn fetch_named(&self, path: &str, kind: NameKind, name: &str) -> Result<Value> {
        match self.fetch(path) {
            Err(RestxError::UnexpectedStatus { actual: 404, .. }) => {
                Err(RestxError::unknown(kind, name))
            }
            other => other,
        }
    }
}

/// Split a server URI into transport base and document root
fn split_server_uri(server_uri: &str) -> Result<(String, String)> {
    let invalid = |reason: &str| RestxError::ConnectionError {
        uri: server_uri.to_string(),
        reason: reason.to_string(),
    };
    let url = reqwest::Url::parse(server_uri).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.query().is_some() {
        return Err(invalid("server URI cannot carry a query"));
    }
    let host = url.host_str().ok_or_else(|| invalid("server URI has no host"))?;
    let base = match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    };
    let doc_root = url.path().trim_end_matches('/').to_string();
    Ok((base, doc_root))
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingTransport;
    use serde_json::json;

    fn meta_json() -> Value {
        json!({
            "code": "/code",
            "doc": "/meta/doc",
            "name": "Test server",
            "resource": "/resource",
            "static": "/static",
            "version": "1.0",
        })
    }

    fn client(transport: RecordingTransport) -> (Client, Arc<RecordingTransport>) {
        let transport = Arc::new(transport);
        let dyn_transport: Arc<dyn Transport> = Arc::clone(&transport) as Arc<dyn Transport>;
        (Client::with_transport(dyn_transport, ""), transport)
    }

    #[test]
    fn test_split_server_uri() {
        let (base, root) = split_server_uri("http://localhost:8001/").unwrap();
        assert_eq!(base, "http://localhost:8001");
        assert_eq!(root, "");
        let (_, root) = split_server_uri("https://example.com/restx/").unwrap();
        assert_eq!(root, "/restx");
        assert!(split_server_uri("ftp://example.com").is_err());
        assert!(split_server_uri("http://example.com/?a=b").is_err());
    }

    #[test]
    fn test_meta_cached() {
        let (c, t) = client(RecordingTransport::new().with_route("/", 200, &meta_json()));
        assert_eq!(c.server_name().unwrap(), "Test server");
        assert_eq!(c.server_version().unwrap(), "1.0");
        assert_eq!(t.call_count(), 1);
        assert_eq!(t.requests()[0].headers["Accept"], "application/json");
    }

    #[test]
    fn test_meta_missing_key() {
        let mut meta = meta_json();
        meta.as_object_mut().unwrap().remove("static");
        let (c, _) = client(RecordingTransport::new().with_route("/", 200, &meta));
        assert!(matches!(
            c.server_meta(),
            Err(RestxError::MalformedSchema { .. })
        ));
    }

    #[test]
    fn test_method_defaults() {
        let t = RecordingTransport::new();
        t.push_json(200, &json!(null));
        t.push_json(200, &json!(null));
        let (c, t) = client(t);
        c.json_send("/a", None, None, None, None).unwrap();
        c.json_send("/a", Some(&json!({"x": 1})), None, None, None).unwrap();
        let requests = t.requests();
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[1].method, HttpMethod::Post);
        assert_eq!(requests[1].body.as_deref(), Some(r#"{"x":1}"#));
        assert_eq!(requests[1].headers["Content-Type"], "application/json");
    }

    #[test]
    fn test_accept_header_overrides_caller() {
        let t = RecordingTransport::new();
        t.push_json(200, &json!(1));
        let (c, t) = client(t);
        let mut headers = IndexMap::new();
        headers.insert("Accept".to_string(), "text/html".to_string());
        headers.insert("X-Trace".to_string(), "1".to_string());
        c.json_send("/a", None, None, None, Some(&headers)).unwrap();
        let sent = t.last_request().unwrap();
        assert_eq!(sent.headers["Accept"], "application/json");
        assert_eq!(sent.headers["X-Trace"], "1");
    }

    #[test]
    fn test_expected_status() {
        let t = RecordingTransport::new();
        t.push_json(404, &json!("not here"));
        let (c, _) = client(t);
        let err = c.json_send("/a", None, None, Some(200), None).unwrap_err();
        assert_eq!(
            err,
            RestxError::UnexpectedStatus {
                expected: 200,
                actual: 404,
                uri: "/a".into()
            }
        );
    }

    #[test]
    fn test_empty_body_is_null() {
        let t = RecordingTransport::new();
        t.push_text(200, "");
        let (c, _) = client(t);
        let r = c.json_send("/a", None, None, Some(200), None).unwrap();
        assert_eq!(r.body, Value::Null);
    }

    #[test]
    fn test_invalid_json_is_server_error() {
        let t = RecordingTransport::new();
        t.push_text(200, "<html>");
        let (c, _) = client(t);
        assert!(matches!(
            c.json_send("/a", None, None, None, None),
            Err(RestxError::ServerError { status: 200, .. })
        ));
    }

    #[test]
    fn test_transport_failures() {
        let t = RecordingTransport::new();
        t.push_error(TransportError::Connect("refused".into()));
        t.push_error(TransportError::Interrupted {
            status: None,
            message: "reset".into(),
        });
        t.push_error(TransportError::Interrupted {
            status: Some(502),
            message: "reset".into(),
        });
        let (c, _) = client(t);
        assert!(matches!(
            c.json_send("/a", None, None, None, None),
            Err(RestxError::ConnectionError { .. })
        ));
        assert!(matches!(
            c.json_send("/a", None, None, None, None),
            Err(RestxError::ServerError { status: 500, .. })
        ));
        assert!(matches!(
            c.json_send("/a", None, None, Some(200), None),
            Err(RestxError::UnexpectedStatus { actual: 502, .. })
        ));
    }

    #[test]
    fn test_listings() {
        let t = RecordingTransport::new()
            .with_route("/", 200, &meta_json())
            .with_route("/code", 200, &json!({"Search": {"desc": "d", "uri": "/code/Search"}}))
            .with_route("/resource", 200, &json!({}))
            .with_route("/meta/doc", 200, &json!("Some docs"));
        let (c, t) = client(t);
        assert_eq!(c.component_names().unwrap(), vec!["Search"]);
        assert_eq!(c.component_names().unwrap(), vec!["Search"]);
        assert!(c.resource_names().unwrap().is_empty());
        assert!(c.resource_names().unwrap().is_empty());
        assert_eq!(c.docs().unwrap(), json!("Some docs"));
        let paths: Vec<String> = t.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/", "/code", "/resource", "/resource", "/meta/doc"]);
    }

    #[test]
    fn test_unknown_component() {
        let t = RecordingTransport::new()
            .with_route("/", 200, &meta_json())
            .with_route("/code/Nope", 404, &json!("Component 'Nope' not defined"));
        let (c, _) = client(t);
        assert!(matches!(
            c.component("Nope"),
            Err(RestxError::UnknownName { kind: NameKind::Component, .. })
        ));
    }
}
