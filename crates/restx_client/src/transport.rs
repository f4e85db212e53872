//! Request transport.

use indexmap::IndexMap;
use restx_core::HttpMethod;
use std::time::Duration;

/// Transport errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No response could be obtained
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The exchange broke off after a response began
    #[error("Interrupted response: {message}")]
    Interrupted {
        /// Status, if one was received
        status: Option<u16>,
        /// What went wrong
        message: String,
    },
}

/// A fully formed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method
    pub method: HttpMethod,
    /// Path, including any query string, or an absolute URL
    pub path: String,
    /// Request headers
    pub headers: IndexMap<String, String>,
    /// Request body text
    pub body: Option<String>,
}

/// A complete response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// Status code
    pub status: u16,
    /// Body text
    pub body: String,
}

impl HttpReply {
    /// Create a reply
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends requests to a server
pub trait Transport: Send + Sync {
    /// Send one request and wait for the full response
    ///
    /// # Errors
    ///
    /// Returns `Connect` if no response was obtained, `Interrupted` if the
    /// response broke off
    fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError>;
}

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Create a transport for a server base such as `http://localhost:8001`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self {
            base: base.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Server base the transport sends to
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{path}", self.base)
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        let url = self.url_for(&request.path);
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let mut builder = self.client.request(method, &url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        tracing::debug!(method = %request.method, %url, "sending request");
        let response = builder
            .send()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| TransportError::Interrupted {
            status: Some(status),
            message: e.to_string(),
        })?;
        tracing::debug!(status, bytes = body.len(), "received response");
        Ok(HttpReply { status, body })
    }
}
