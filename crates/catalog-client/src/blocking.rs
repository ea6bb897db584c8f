//! Blocking query engine
//!
//! Every catalog read goes through [`QueryEngine::query`]. A read becomes a
//! long poll when the caller passes the index from an earlier read: the
//! registry then holds the request until its state moves past that index or
//! the hold time runs out, and answers with the new index in the
//! `X-Consul-Index` header.
//!
//! The engine owns no state between calls. The caller carries the index
//! forward, normally with [`QueryOptions::after`].

use crate::error::{Error, Result};
use crate::query::{QueryMeta, QueryOptions};
use crate::transport::{HttpRequest, Method, Transport};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Hold time the registry applies when a blocking read sets no `wait`
pub const DEFAULT_HOLD: Duration = Duration::from_secs(5 * 60);

/// Longest hold the registry honors
pub const MAX_HOLD: Duration = Duration::from_secs(10 * 60);

/// Default deadline for reads that do not block
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A decoded body together with the metadata describing it
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse<T> {
    /// Response payload
    pub value: T,
    /// Registry state the payload was read at
    pub meta: QueryMeta,
}

impl<T> QueryResponse<T> {
    /// Split into payload and metadata
    pub fn into_parts(self) -> (T, QueryMeta) {
        (self.value, self.meta)
    }

    /// Transform the payload, keeping the metadata attached
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResponse<U> {
        QueryResponse {
            value: f(self.value),
            meta: self.meta,
        }
    }
}

/// Executes reads and extracts consistency metadata
#[derive(Clone)]
pub struct QueryEngine {
    transport: Arc<dyn Transport>,
    request_timeout: Duration,
    datacenter: Option<String>,
}

impl QueryEngine {
    /// Create an engine over a transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            datacenter: None,
        }
    }

    /// Deadline for non-blocking reads, also added on top of blocking holds
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Datacenter used when a read does not name one
    pub fn with_datacenter(mut self, dc: Option<String>) -> Self {
        self.datacenter = dc;
        self
    }

    /// Client-side deadline for a read with these options.
    ///
    /// Blocking reads get the hold time plus the up-to-1/16 jitter the
    /// registry adds, plus the ordinary request timeout. A blocking read
    /// without a usable wait is held for [`DEFAULT_HOLD`].
    pub fn timeout_for(&self, options: &QueryOptions) -> Duration {
        if options.is_blocking() {
            let hold = options.hold().unwrap_or(DEFAULT_HOLD).min(MAX_HOLD);
            hold.saturating_add(hold / 16).saturating_add(self.request_timeout)
        } else {
            self.request_timeout
        }
    }

    /// Issue a GET against `path` and return the raw body with its metadata.
    ///
    /// `params` are endpoint-specific and sent before the option parameters.
    pub async fn query(
        &self,
        path: &[&str],
        params: Vec<(String, String)>,
        options: &QueryOptions,
    ) -> Result<QueryResponse<Vec<u8>>> {
        let mut effective = options.clone();
        if effective.dc.is_none() {
            effective.dc = self.datacenter.clone();
        }

        let timeout = self.timeout_for(&effective);
        let request = path
            .iter()
            .fold(HttpRequest::new(Method::Get, ""), |req, segment| req.segment(*segment))
            .query(params)
            .query(effective.to_params())
            .timeout(timeout);

        if effective.is_blocking() {
            debug!(
                "Blocking read {} index={:?} wait={:?} timeout={:?}",
                request.path(),
                effective.index,
                effective.wait,
                timeout
            );
        } else {
            if effective.wait.is_some() {
                debug!("Ignoring wait on {} without an index", request.path());
            }
            debug!("Read {}", request.path());
        }

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(Error::Registry {
                status: response.status,
                body: response.text(),
            });
        }

        let meta = QueryMeta::from_headers(|name| response.header(name));
        Ok(QueryResponse {
            value: response.body,
            meta,
        })
    }

    /// [`query`](Self::query) and decode the body as JSON
    pub async fn query_json<T: DeserializeOwned>(
        &self,
        path: &[&str],
        params: Vec<(String, String)>,
        options: &QueryOptions,
    ) -> Result<QueryResponse<T>> {
        let response = self.query(path, params, options).await?;
        let value = serde_json::from_slice(&response.value).map_err(Error::Decode)?;
        Ok(QueryResponse {
            value,
            meta: response.meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Consistency;
    use crate::transport::{HttpResponse, MemoryTransport};

    fn engine_with(transport: &Arc<MemoryTransport>) -> QueryEngine {
        QueryEngine::new(transport.clone())
    }

    #[test]
    fn test_timeouts() {
        let engine = QueryEngine::new(Arc::new(MemoryTransport::new()))
            .with_request_timeout(Duration::from_secs(2));

        assert_eq!(engine.timeout_for(&QueryOptions::new()), Duration::from_secs(2));

        // wait alone does not block
        let wait_only = QueryOptions::new().with_wait(Duration::from_secs(60));
        assert_eq!(engine.timeout_for(&wait_only), Duration::from_secs(2));

        let blocking = QueryOptions::new()
            .with_index(5)
            .with_wait(Duration::from_secs(32));
        assert_eq!(engine.timeout_for(&blocking), Duration::from_secs(36));

        let default_hold = QueryOptions::new().with_index(5);
        assert_eq!(
            engine.timeout_for(&default_hold),
            DEFAULT_HOLD + DEFAULT_HOLD / 16 + Duration::from_secs(2)
        );

        let over_max = QueryOptions::new()
            .with_index(5)
            .with_wait(Duration::from_secs(3600));
        assert_eq!(
            engine.timeout_for(&over_max),
            MAX_HOLD + MAX_HOLD / 16 + Duration::from_secs(2)
        );
    }

    #[test]
    fn test_zero_wait_uses_default_hold() {
        let engine = QueryEngine::new(Arc::new(MemoryTransport::new()));
        let zero = QueryOptions::new().with_index(5).with_wait(Duration::ZERO);
        let timeout = engine.timeout_for(&zero);
        assert!(timeout > DEFAULT_HOLD, "client deadline is {timeout:?}");
        assert_eq!(timeout, engine.timeout_for(&QueryOptions::new().with_index(5)));
    }

    #[test]
    fn test_sub_millisecond_wait_is_rounded_up() {
        let engine = QueryEngine::new(Arc::new(MemoryTransport::new()))
            .with_request_timeout(Duration::from_secs(1));
        let tiny = QueryOptions::new()
            .with_index(5)
            .with_wait(Duration::from_micros(400));
        assert_eq!(
            tiny.to_params()[0],
            ("wait".to_string(), "1ms".to_string())
        );
        assert!(engine.timeout_for(&tiny) > Duration::from_secs(1));
    }

    #[test]
    fn test_huge_request_timeout_saturates() {
        let engine = QueryEngine::new(Arc::new(MemoryTransport::new()))
            .with_request_timeout(Duration::MAX);
        let blocking = QueryOptions::new().with_index(1);
        assert_eq!(engine.timeout_for(&blocking), Duration::MAX);
    }

    #[smol_potat::test]
    async fn test_query_attaches_params_and_extracts_meta() {
        let transport = Arc::new(MemoryTransport::new());
        transport.respond(
            Method::Get,
            "/v1/catalog/service/web",
            HttpResponse::new(200, "[]")
                .with_header("X-Consul-Index", "43")
                .with_header("X-Consul-KnownLeader", "false")
                .with_header("X-Consul-LastContact", "250"),
        );

        let options = QueryOptions::new()
            .with_index(42)
            .with_wait(Duration::from_secs(5))
            .with_consistency(Consistency::Stale);
        let response = engine_with(&transport)
            .query(&["v1", "catalog", "service", "web"], Vec::new(), &options)
            .await
            .unwrap();

        assert_eq!(response.value, b"[]".to_vec());
        assert_eq!(response.meta.index, Some(43));
        assert_eq!(response.meta.known_leader, Some(false));
        assert_eq!(response.meta.last_contact, Some(Duration::from_millis(250)));

        let sent = transport.last_request().unwrap();
        assert_eq!(
            sent.query,
            vec![
                ("wait".to_string(), "5s".to_string()),
                ("index".to_string(), "42".to_string()),
                ("stale".to_string(), String::new()),
            ]
        );
        assert!(sent.timeout.unwrap() > Duration::from_secs(5));
    }

    #[smol_potat::test]
    async fn test_default_datacenter_applies_only_when_unset() {
        let transport = Arc::new(MemoryTransport::new());
        transport.respond(Method::Get, "/v1/x", HttpResponse::new(200, "{}"));
        let engine = engine_with(&transport).with_datacenter(Some("eu-west-1".into()));

        engine.query(&["v1", "x"], Vec::new(), &QueryOptions::new()).await.unwrap();
        assert_eq!(
            transport.last_request().unwrap().query,
            vec![("dc".to_string(), "eu-west-1".to_string())]
        );

        let explicit = QueryOptions::new().with_datacenter("us-east-1");
        engine.query(&["v1", "x"], Vec::new(), &explicit).await.unwrap();
        assert_eq!(
            transport.last_request().unwrap().query,
            vec![("dc".to_string(), "us-east-1".to_string())]
        );
    }

    #[smol_potat::test]
    async fn test_missing_headers_leave_meta_unset() {
        let transport = Arc::new(MemoryTransport::new());
        transport.respond(Method::Get, "/v1/x", HttpResponse::new(200, "{}"));

        let response = engine_with(&transport)
            .query(&["v1", "x"], Vec::new(), &QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(response.meta, QueryMeta::default());
    }

    #[smol_potat::test]
    async fn test_non_success_is_registry_error() {
        let transport = Arc::new(MemoryTransport::new());
        transport.respond(
            Method::Get,
            "/v1/x",
            HttpResponse::new(500, "No cluster leader"),
        );

        let err = engine_with(&transport)
            .query(&["v1", "x"], Vec::new(), &QueryOptions::new().with_consistency(Consistency::Consistent))
            .await
            .unwrap_err();
        match err {
            Error::Registry { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "No cluster leader");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Failed reads are not retried by the engine
        assert_eq!(transport.requests().len(), 1);
    }

    #[smol_potat::test]
    async fn test_transport_error_surfaces() {
        let transport = Arc::new(MemoryTransport::new());
        transport.fail(Method::Get, "/v1/x", "connection reset");

        let err = engine_with(&transport)
            .query(&["v1", "x"], Vec::new(), &QueryOptions::new())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[smol_potat::test]
    async fn test_query_json_decode_error() {
        let transport = Arc::new(MemoryTransport::new());
        transport.respond(Method::Get, "/v1/x", HttpResponse::new(200, "not json"));

        let err = engine_with(&transport)
            .query_json::<Vec<u32>>(&["v1", "x"], Vec::new(), &QueryOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
