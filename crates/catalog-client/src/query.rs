//! Read options, response metadata and the query parameter builder

use crate::duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Header carrying the consistency index
pub const HEADER_INDEX: &str = "x-consul-index";
/// Header reporting whether the answering agent knows the leader
pub const HEADER_KNOWN_LEADER: &str = "x-consul-knownleader";
/// Header reporting milliseconds since the agent last contacted the leader
pub const HEADER_LAST_CONTACT: &str = "x-consul-lastcontact";

/// Smallest hold the wire format can express
const MIN_WAIT: Duration = Duration::from_millis(1);

/// How fresh a read must be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    /// The queried agent's usual view, forwarded to the leader
    #[default]
    Default,
    /// Any server may answer without confirming leadership
    Stale,
    /// The leader must confirm it is still leader before answering
    Consistent,
}

/// Options controlling a single read
///
/// All fields are optional. The default value is a plain, non-blocking read
/// of the latest state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Maximum time the registry may hold the request open
    pub wait: Option<Duration>,
    /// Block until the registry's index exceeds this value
    pub index: Option<u64>,
    /// Datacenter to read from
    pub dc: Option<String>,
    /// Freshness requirement
    pub consistency: Consistency,
}

impl QueryOptions {
    /// Plain non-blocking read
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the long-poll hold duration
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = Some(wait);
        self
    }

    /// Block until the index moves past `index`
    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    /// Continue from the metadata of an earlier read.
    ///
    /// Leaves the options untouched when the earlier read carried no index.
    pub fn after(mut self, meta: &QueryMeta) -> Self {
        if let Some(index) = meta.index {
            self.index = Some(index);
        }
        self
    }

    /// Scope the read to a datacenter
    pub fn with_datacenter(mut self, dc: impl Into<String>) -> Self {
        self.dc = Some(dc.into());
        self
    }

    /// Set the freshness requirement
    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    /// Whether the read will be held open server-side.
    ///
    /// Only an index makes a read block; `wait` on its own is ignored.
    pub fn is_blocking(&self) -> bool {
        self.index.is_some()
    }

    /// Hold time to request from the registry.
    ///
    /// A zero wait means "use the registry's default hold" and is treated as
    /// unset. Waits below a millisecond are rounded up so they never go on
    /// the wire as `0s`.
    pub fn hold(&self) -> Option<Duration> {
        self.wait
            .filter(|wait| !wait.is_zero())
            .map(|wait| wait.max(MIN_WAIT))
    }

    /// Build the query string pairs for these options.
    ///
    /// Flag parameters (`stale`, `consistent`) carry an empty value.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(index) = self.index {
            if let Some(wait) = self.hold() {
                params.push(("wait".to_string(), duration::format(wait)));
            }
            params.push(("index".to_string(), index.to_string()));
        }

        if let Some(dc) = &self.dc {
            params.push(("dc".to_string(), dc.clone()));
        }

        match self.consistency {
            Consistency::Default => {}
            Consistency::Stale => params.push(("stale".to_string(), String::new())),
            Consistency::Consistent => params.push(("consistent".to_string(), String::new())),
        }

        params
    }
}

/// Registry state observed by a read
///
/// A field is `None` when the response did not carry the matching header or
/// carried a value that could not be parsed. `index: None` is therefore
/// distinct from `index: Some(0)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMeta {
    /// Consistency index of the returned data
    pub index: Option<u64>,
    /// Whether the answering agent had a known leader
    pub known_leader: Option<bool>,
    /// Time since the answering agent last heard from the leader
    #[serde(with = "humantime_serde", default)]
    pub last_contact: Option<Duration>,
}

impl QueryMeta {
    /// Extract metadata from response headers.
    ///
    /// `header` performs a case-insensitive lookup.
    pub fn from_headers<'a>(header: impl Fn(&str) -> Option<&'a str>) -> Self {
        let index = header(HEADER_INDEX).and_then(|v| parse_or_log(HEADER_INDEX, v, |s| s.parse().ok()));
        let known_leader = header(HEADER_KNOWN_LEADER)
            .and_then(|v| parse_or_log(HEADER_KNOWN_LEADER, v, parse_bool));
        let last_contact = header(HEADER_LAST_CONTACT).and_then(|v| {
            parse_or_log(HEADER_LAST_CONTACT, v, |s| s.parse().ok().map(Duration::from_millis))
        });

        Self {
            index,
            known_leader,
            last_contact,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_or_log<T>(name: &str, raw: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        tracing::debug!("Ignoring malformed {} header: {:?}", name, raw);
    }
    parsed
}
