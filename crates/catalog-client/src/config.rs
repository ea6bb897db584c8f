//! Configuration for connecting to an agent

use crate::blocking::DEFAULT_REQUEST_TIMEOUT;
use crate::error::{Error, Result};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Address of an agent on the local host
pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:8500";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the agent
    #[serde(default = "default_address")]
    pub address: String,
    /// Datacenter for reads that do not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    /// ACL token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Deadline for non-blocking requests
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
    /// TLS configuration (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<ClientTlsConfig>,
}

/// TLS configuration for the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientTlsConfig {
    /// Path to an extra CA certificate in PEM format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert_path: Option<PathBuf>,
    /// Whether to accept invalid certificates (DANGEROUS - testing only)
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Read a YAML (by extension) or JSON document from disk
pub(crate) async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    use async_fs::File;
    use futures::io::AsyncReadExt;

    let mut file = File::open(path).await?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).await?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&contents)?),
        _ => serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Invalid JSON in {}: {}", path.display(), e))),
    }
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            datacenter: None,
            token: None,
            request_timeout: default_request_timeout(),
            tls: None,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `address` with everything else defaulted
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Set the default datacenter
    pub fn with_datacenter(mut self, dc: impl Into<String>) -> Self {
        self.datacenter = Some(dc.into());
        self
    }

    /// Set the ACL token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load configuration from file
    pub async fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config: Self = read_document(path.as_ref()).await?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.address)
            .map_err(|e| Error::Config(format!("Invalid address {:?}: {}", self.address, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::Config(format!("Unsupported scheme: {}", other))),
        }
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.request_timeout.is_zero() {
            return Err(Error::Config("request_timeout must be positive".to_string()));
        }
        if let Some(dc) = &self.datacenter {
            if dc.trim().is_empty() {
                return Err(Error::Config("datacenter cannot be empty when set".to_string()));
            }
        }
        Ok(())
    }
}
