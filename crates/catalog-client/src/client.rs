//! Client bundling a transport with its configuration

use crate::agent::RegistrationWriter;
use crate::blocking::{QueryEngine, QueryResponse};
use crate::catalog::{CatalogReader, Lookup, Scope};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::RegistrationSpec;
use crate::query::QueryOptions;
use crate::transport::{HttpTransport, Transport};
use crate::watch::CatalogWatch;
use std::sync::Arc;

/// Entry point for catalog reads and agent mutations
///
/// Holds no per-call state. Clones share the transport, so one client can
/// serve many concurrent calls.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl Client {
    /// Build a client talking HTTP to the configured agent
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(&config).await?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a client over any transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { transport, config }
    }

    /// Configuration in use
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Blocking query engine scoped by this configuration
    pub fn engine(&self) -> QueryEngine {
        QueryEngine::new(self.transport.clone())
            .with_request_timeout(self.config.request_timeout)
            .with_datacenter(self.config.datacenter.clone())
    }

    /// Catalog reader
    pub fn catalog(&self) -> CatalogReader {
        CatalogReader::new(self.engine())
    }

    /// Registration writer for the local agent
    pub fn agent(&self) -> RegistrationWriter {
        RegistrationWriter::new(self.transport.clone())
            .with_request_timeout(self.config.request_timeout)
    }

    /// Watch a service for changes, starting from `options`
    pub fn watch(&self, service_name: impl Into<String>, options: QueryOptions) -> CatalogWatch {
        CatalogWatch::new(self.catalog(), service_name, options)
    }

    /// See [`CatalogReader::lookup`]
    pub async fn lookup(
        &self,
        service_name: &str,
        scope: Scope,
        options: &QueryOptions,
    ) -> Result<QueryResponse<Lookup>> {
        self.catalog().lookup(service_name, scope, options).await
    }

    /// See [`RegistrationWriter::register`]
    pub async fn register(&self, spec: &RegistrationSpec) -> Result<()> {
        self.agent().register(spec).await
    }

    /// See [`RegistrationWriter::deregister`]
    pub async fn deregister(&self, service_id: &str) -> Result<()> {
        self.agent().deregister(service_id).await
    }
}
