//! Data models for catalog reads and agent registrations

use crate::duration;
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// One registered service instance as seen by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CatalogService", into = "CatalogService")]
pub struct ServiceEntry {
    /// Logical service name
    pub service_name: String,

    /// Instance identifier, unique per agent
    pub service_id: String,

    /// Address to reach the instance on. Falls back to the node address
    /// when the instance did not register one.
    pub address: String,

    /// Port the instance listens on
    pub port: u16,

    /// Tags in registration order
    pub tags: Vec<String>,

    /// Node hosting the instance
    pub node: Option<String>,

    /// Datacenter the entry was read from
    pub datacenter: Option<String>,

    /// Free-form instance metadata
    pub meta: BTreeMap<String, String>,

    /// Aggregated health, when the endpoint reports it
    pub status: Option<HealthState>,

    /// Raft index that created the entry
    pub create_index: Option<u64>,

    /// Raft index of the last modification
    pub modify_index: Option<u64>,
}

/// Aggregated health of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// All checks passing
    Passing,
    /// At least one check warning
    Warning,
    /// At least one check critical
    Critical,
    /// Instance or node in maintenance mode
    Maintenance,
}

/// Wire shape of `/v1/catalog/service/{name}` array elements
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CatalogService {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    datacenter: Option<String>,
    service_name: String,
    #[serde(rename = "ServiceID")]
    service_id: String,
    #[serde(default)]
    service_address: Option<String>,
    service_port: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    service_tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    service_meta: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<HealthState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    create_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modify_index: Option<u64>,
}

impl From<CatalogService> for ServiceEntry {
    fn from(wire: CatalogService) -> Self {
        let address = match wire.service_address {
            Some(addr) if !addr.is_empty() => addr,
            _ => wire.address.unwrap_or_default(),
        };

        Self {
            service_name: wire.service_name,
            service_id: wire.service_id,
            address,
            port: wire.service_port,
            tags: wire.service_tags,
            node: wire.node,
            datacenter: wire.datacenter,
            meta: wire.service_meta,
            status: wire.status,
            create_index: wire.create_index,
            modify_index: wire.modify_index,
        }
    }
}

impl From<ServiceEntry> for CatalogService {
    fn from(entry: ServiceEntry) -> Self {
        Self {
            node: entry.node,
            address: None,
            datacenter: entry.datacenter,
            service_name: entry.service_name,
            service_id: entry.service_id,
            service_address: Some(entry.address),
            service_port: entry.port,
            service_tags: entry.tags,
            service_meta: entry.meta,
            status: entry.status,
            create_index: entry.create_index,
            modify_index: entry.modify_index,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ServiceEntry {
    /// Check if the instance carries a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// `address:port` suitable for connecting
    pub fn socket_addr_string(&self) -> String {
        if self.address.contains(':') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}

/// Service definition submitted to the local agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegistrationSpec {
    /// Logical service name
    pub name: String,

    /// Instance id; the agent uses the name when absent
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Address advertised for the instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Port advertised for the instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Free-form metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,

    /// Health checks bound to the instance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<CheckDefinition>,
}

impl RegistrationSpec {
    /// Create a definition with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            address: None,
            port: None,
            tags: Vec::new(),
            meta: BTreeMap::new(),
            checks: Vec::new(),
        }
    }

    /// Set the instance id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the advertised address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the advertised port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Append a tag, ignoring duplicates
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Add a metadata pair
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Attach a health check
    pub fn with_check(mut self, check: CheckDefinition) -> Self {
        self.checks.push(check);
        self
    }

    /// Load a definition from a YAML or JSON file
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let spec: Self = crate::config::read_document(path.as_ref()).await?;
        spec.validate()?;
        Ok(spec)
    }

    /// Id the instance will be known by once registered
    pub fn service_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    /// Reject definitions the agent would refuse or misinterpret
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "Service name cannot be empty".to_string(),
            ));
        }
        if let Some(id) = &self.id {
            if id.trim().is_empty() {
                return Err(Error::InvalidArgument(
                    "Service id cannot be empty when set".to_string(),
                ));
            }
        }
        for check in &self.checks {
            check.validate()?;
        }
        Ok(())
    }
}

/// Health check attached to a registration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckDefinition {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// URL polled with GET
    #[serde(rename = "HTTP", default, skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,

    /// `host:port` probed with a TCP connect
    #[serde(rename = "TCP", default, skip_serializing_if = "Option::is_none")]
    pub tcp: Option<String>,

    /// Time-to-live for checks the service reports itself
    #[serde(
        rename = "TTL",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "duration::serialize_opt",
        deserialize_with = "humantime_serde::deserialize"
    )]
    pub ttl: Option<Duration>,

    /// Probe interval
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "duration::serialize_opt",
        deserialize_with = "humantime_serde::deserialize"
    )]
    pub interval: Option<Duration>,

    /// Probe timeout
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "duration::serialize_opt",
        deserialize_with = "humantime_serde::deserialize"
    )]
    pub timeout: Option<Duration>,

    /// Reap the instance after it stays critical this long
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "duration::serialize_opt",
        deserialize_with = "humantime_serde::deserialize"
    )]
    pub deregister_critical_service_after: Option<Duration>,
}

impl CheckDefinition {
    /// HTTP check polling `url` every `interval`
    pub fn http(url: impl Into<String>, interval: Duration) -> Self {
        Self {
            http: Some(url.into()),
            interval: Some(interval),
            ..Default::default()
        }
    }

    /// TCP check connecting to `addr` every `interval`
    pub fn tcp(addr: impl Into<String>, interval: Duration) -> Self {
        Self {
            tcp: Some(addr.into()),
            interval: Some(interval),
            ..Default::default()
        }
    }

    /// TTL check the service must refresh within `ttl`
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Default::default()
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the probe timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reap the instance after it has been critical for `after`
    pub fn with_deregister_after(mut self, after: Duration) -> Self {
        self.deregister_critical_service_after = Some(after);
        self
    }

    fn validate(&self) -> Result<()> {
        let kinds = [self.http.is_some(), self.tcp.is_some(), self.ttl.is_some()]
            .iter()
            .filter(|set| **set)
            .count();
        if kinds != 1 {
            return Err(Error::InvalidArgument(
                "Check must set exactly one of HTTP, TCP or TTL".to_string(),
            ));
        }
        if (self.http.is_some() || self.tcp.is_some()) && self.interval.is_none() {
            return Err(Error::InvalidArgument(
                "HTTP and TCP checks require an interval".to_string(),
            ));
        }
        Ok(())
    }
}
