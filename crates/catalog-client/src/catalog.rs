//! Catalog reads

use crate::blocking::{QueryEngine, QueryResponse};
use crate::error::{Error, Result};
use crate::models::ServiceEntry;
use crate::query::QueryOptions;
use serde::{Deserialize, Serialize};

/// How many instances a lookup returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Only the first instance; absence is an error
    #[default]
    First,
    /// Every instance, possibly none
    All,
}

/// Result of a lookup, shaped by its [`Scope`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// First instance in catalog order
    First(ServiceEntry),
    /// All instances in catalog order
    All(Vec<ServiceEntry>),
}

impl Lookup {
    /// Flatten into a list of entries
    pub fn into_entries(self) -> Vec<ServiceEntry> {
        match self {
            Lookup::First(entry) => vec![entry],
            Lookup::All(entries) => entries,
        }
    }
}

/// Reads service instances from the catalog
#[derive(Clone)]
pub struct CatalogReader {
    engine: QueryEngine,
}

impl CatalogReader {
    /// Create a reader on top of a query engine
    pub fn new(engine: QueryEngine) -> Self {
        Self { engine }
    }

    /// The engine backing this reader
    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Look up `service_name` with the given scope.
    ///
    /// Order is as returned by the registry and may differ between calls.
    pub async fn lookup(
        &self,
        service_name: &str,
        scope: Scope,
        options: &QueryOptions,
    ) -> Result<QueryResponse<Lookup>> {
        match scope {
            Scope::All => Ok(self.service(service_name, options).await?.map(Lookup::All)),
            Scope::First => Ok(self.first(service_name, options).await?.map(Lookup::First)),
        }
    }

    /// All instances of a service; an unknown service yields an empty list
    pub async fn service(
        &self,
        service_name: &str,
        options: &QueryOptions,
    ) -> Result<QueryResponse<Vec<ServiceEntry>>> {
        if service_name.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "Service name cannot be empty".to_string(),
            ));
        }

        self.engine
            .query_json(&["v1", "catalog", "service", service_name], Vec::new(), options)
            .await
    }

    /// First instance of a service, or [`Error::NotFound`] when it has none
    pub async fn first(
        &self,
        service_name: &str,
        options: &QueryOptions,
    ) -> Result<QueryResponse<ServiceEntry>> {
        let (entries, meta) = self.service(service_name, options).await?.into_parts();
        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(service_name.to_string()))?;
        Ok(QueryResponse { value: entry, meta })
    }
}
