//! HTTP transport abstraction
//!
//! The engine, reader and writer only ever talk to a [`Transport`]. The
//! reqwest-backed [`HttpTransport`] is what applications use; the scripted
//! [`MemoryTransport`] stands in for the registry in tests.

pub mod http;
pub mod memory;

pub use http::HttpTransport;
pub use memory::MemoryTransport;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// HTTP verbs the registry API needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// PUT
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Put => write!(f, "PUT"),
        }
    }
}

/// A request against the configured agent
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Verb
    pub method: Method,
    /// Unescaped path segments, e.g. `["v1", "catalog", "service", "web"]`
    pub path_segments: Vec<String>,
    /// Query string pairs in order
    pub query: Vec<(String, String)>,
    /// Request body
    pub body: Option<Vec<u8>>,
    /// Client-side deadline for the whole exchange
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Build a request from a static route prefix and trailing segments
    pub fn new(method: Method, route: &str) -> Self {
        Self {
            method,
            path_segments: route
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Append a path segment; it is escaped by the transport
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.path_segments.push(segment.into());
        self
    }

    /// Append query pairs
    pub fn query(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(params);
        self
    }

    /// Set the body
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the client-side timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `/`-joined path, unescaped. Used for logging and route matching.
    pub fn path(&self) -> String {
        format!("/{}", self.path_segments.join("/"))
    }
}

/// A response from the agent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Headers keyed by lowercased name
    pub headers: HashMap<String, String>,
    /// Raw body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Response with a status and body
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Add a header; the name is normalized to lowercase
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossily decoded
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Performs HTTP exchanges with the agent
///
/// Implementations must honor `HttpRequest::timeout` and stop work when the
/// returned future is dropped.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}
