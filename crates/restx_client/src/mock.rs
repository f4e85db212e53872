//! Scripted transport for tests.
//!
//! GET requests are answered from fixed routes first. Everything else is
//! answered from a queue. Every request is recorded.

use crate::transport::{HttpReply, HttpRequest, Transport, TransportError};
use indexmap::IndexMap;
use restx_core::{HttpMethod, Value};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Transport that answers from a script and records requests
#[derive(Debug, Default)]
pub struct RecordingTransport {
    routes: Mutex<IndexMap<String, HttpReply>>,
    queue: Mutex<VecDeque<Result<HttpReply, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    /// Create a transport with no script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer GET requests for `path` with a JSON body
    ///
    /// A route matches the full path first, then the path without its query.
    #[must_use]
    pub fn with_route(self, path: impl Into<String>, status: u16, body: &Value) -> Self {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), HttpReply::new(status, body.to_string()));
        self
    }

    /// Queue a JSON reply for the next unrouted request
    pub fn push_json(&self, status: u16, body: &Value) {
        self.push(Ok(HttpReply::new(status, body.to_string())));
    }

    /// Queue a raw text reply
    pub fn push_text(&self, status: u16, body: &str) {
        self.push(Ok(HttpReply::new(status, body)));
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(&self, reply: Result<HttpReply, TransportError>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// All requests sent so far
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent request
    #[must_use]
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Number of requests sent so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let bare = request.path.split('?').next().unwrap_or_default();
        if request.method == HttpMethod::Get {
            let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(reply) = routes.get(&request.path).or_else(|| routes.get(bare)) {
                return Ok(reply.clone());
            }
        }
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Connect(format!(
                    "no scripted reply for {}",
                    request.path
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get(path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: path.into(),
            headers: IndexMap::new(),
            body: None,
        }
    }

    #[test]
    fn test_routes_then_queue() {
        let t = RecordingTransport::new().with_route("/meta", 200, &json!({"a": 1}));
        t.push_json(201, &json!("queued"));
        assert_eq!(t.send(&get("/meta?x=1")).unwrap().status, 200);
        assert_eq!(t.send(&get("/other")).unwrap().status, 201);
        assert!(matches!(t.send(&get("/other")), Err(TransportError::Connect(_))));
        assert_eq!(t.call_count(), 3);
        assert_eq!(t.last_request().unwrap().path, "/other");
    }

    #[test]
    fn test_routes_only_answer_get() {
        let t = RecordingTransport::new().with_route("/code/C", 200, &json!("schema"));
        t.push_json(201, &json!("created"));
        let mut post = get("/code/C");
        post.method = HttpMethod::Post;
        assert_eq!(t.send(&post).unwrap().status, 201);
        assert_eq!(t.send(&get("/code/C")).unwrap().status, 200);
    }
}
