//! reqwest-backed transport

use super::{HttpRequest, HttpResponse, Method, Transport};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Url;
use std::collections::HashMap;
use tracing::debug;

/// Header carrying the ACL token
pub const HEADER_TOKEN: &str = "x-consul-token";

/// Transport talking HTTP(S) to a single agent
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    /// Build a transport from configuration.
    ///
    /// Reads the CA certificate from disk when one is configured.
    pub async fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let base = config.base_url()?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(token)
                .map_err(|_| Error::Config("ACL token contains invalid characters".to_string()))?;
            headers.insert(HEADER_TOKEN, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);

        if let Some(tls) = &config.tls {
            if let Some(ca_path) = &tls.ca_cert_path {
                use futures::io::AsyncReadExt;

                let mut file = async_fs::File::open(ca_path).await.map_err(|e| {
                    Error::Config(format!("Failed to open CA certificate {}: {}", ca_path.display(), e))
                })?;
                let mut pem = Vec::new();
                file.read_to_end(&mut pem).await?;

                let cert = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| Error::Config(format!("Failed to parse CA certificate: {}", e)))?;
                builder = builder.add_root_certificate(cert);
            }
            if tls.accept_invalid_certs {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base })
    }

    /// Wrap an existing reqwest client
    pub fn with_client(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, request: &HttpRequest) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::Config(format!("Base URL cannot carry a path: {}", self.base)))?;
            segments.pop_if_empty();
            segments.extend(request.path_segments.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = self.url_for(&request)?;
        debug!("{} {} query={:?}", request.method, url.path(), request.query);

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Put => self.client.put(url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(|e| map_error(e, &request.timeout))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_error(e, &request.timeout))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_error(err: reqwest::Error, timeout: &Option<std::time::Duration>) -> Error {
    match timeout {
        Some(timeout) if err.is_timeout() => Error::Timeout(*timeout),
        _ => Error::Transport(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_escapes_segments() {
        let transport = HttpTransport::with_client(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:8500").unwrap(),
        );
        let req = HttpRequest::new(Method::Get, "/v1/catalog/service").segment("web/../admin");
        let url = transport.url_for(&req).unwrap();
        assert_eq!(url.path(), "/v1/catalog/service/web%2F..%2Fadmin");
    }

    #[test]
    fn test_url_keeps_base_path_prefix() {
        let transport = HttpTransport::with_client(
            reqwest::Client::new(),
            Url::parse("https://gateway.internal/consul/").unwrap(),
        );
        let req = HttpRequest::new(Method::Put, "/v1/agent/service/register");
        let url = transport.url_for(&req).unwrap();
        assert_eq!(url.as_str(), "https://gateway.internal/consul/v1/agent/service/register");
    }
}
