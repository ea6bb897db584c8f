//! One-shot helpers that build a client per call
//!
//! Handy for scripts and tests. Anything issuing more than a couple of calls
//! should hold a [`Client`] instead so the connection pool is reused.

use crate::blocking::QueryResponse;
use crate::catalog::{Lookup, Scope};
use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::RegistrationSpec;
use crate::query::QueryOptions;

/// Look up a service using a fresh client for `config`
pub async fn lookup(
    config: &ClientConfig,
    service_name: &str,
    scope: Scope,
    options: &QueryOptions,
) -> Result<QueryResponse<Lookup>> {
    Client::connect(config.clone())
        .await?
        .lookup(service_name, scope, options)
        .await
}

/// Register a service using a fresh client for `config`
pub async fn register(config: &ClientConfig, spec: &RegistrationSpec) -> Result<()> {
    Client::connect(config.clone()).await?.register(spec).await
}

/// Deregister a service using a fresh client for `config`
pub async fn deregister(config: &ClientConfig, service_id: &str) -> Result<()> {
    Client::connect(config.clone()).await?.deregister(service_id).await
}
