//! Caller-driven watch over a service's instances
//!
//! A [`CatalogWatch`] is a loop the caller turns: each
//! [`next`](CatalogWatch::next) issues one blocking lookup from the last
//! index seen. Nothing runs in the background and failed calls are not
//! retried.

use crate::catalog::CatalogReader;
use crate::error::Result;
use crate::models::ServiceEntry;
use crate::query::{QueryMeta, QueryOptions};
use tracing::{debug, warn};

/// Outcome of one turn of a watch
#[derive(Debug, Clone, PartialEq)]
pub struct WatchUpdate {
    /// Instances as of `meta.index`
    pub entries: Vec<ServiceEntry>,
    /// Metadata of the read
    pub meta: QueryMeta,
    /// Whether the index moved since the previous turn. Always true on the
    /// first turn.
    pub changed: bool,
}

/// Repeated blocking lookups of one service
pub struct CatalogWatch {
    reader: CatalogReader,
    service_name: String,
    options: QueryOptions,
    last_index: Option<u64>,
    observed: Option<u64>,
}

impl CatalogWatch {
    /// Create a watch. An index already present in `options` is where the
    /// first turn blocks from.
    pub fn new(reader: CatalogReader, service_name: impl Into<String>, options: QueryOptions) -> Self {
        let last_index = options.index;
        Self {
            reader,
            service_name: service_name.into(),
            options,
            last_index,
            observed: None,
        }
    }

    /// Name of the watched service
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Index the next turn blocks from, `None` when it will not block
    pub fn last_index(&self) -> Option<u64> {
        self.last_index
    }

    /// Perform one blocking lookup.
    ///
    /// On error the stored index is left as it was.
    pub async fn next(&mut self) -> Result<WatchUpdate> {
        let mut options = self.options.clone();
        options.index = self.last_index;

        let (entries, meta) = self
            .reader
            .service(&self.service_name, &options)
            .await?
            .into_parts();

        // Compare against what the registry actually reported, not the
        // clamped index the read blocked from
        let previous = self.observed.or(self.last_index);
        self.last_index = next_index(previous, meta.index);
        if let (Some(prev), Some(seen)) = (previous, meta.index) {
            if seen < prev {
                warn!(
                    "Index for {} went backwards ({} -> {}), resetting",
                    self.service_name, prev, seen
                );
            }
        }

        let changed = self.observed.is_none() || meta.index != self.observed;
        self.observed = meta.index;
        debug!(
            "Watch {} index {:?} -> {:?} changed={}",
            self.service_name, previous, meta.index, changed
        );

        Ok(WatchUpdate {
            entries,
            meta,
            changed,
        })
    }
}

/// Index to block from after observing `observed`, where `previous` is the
/// index reported by the read before.
///
/// - no index in the response: the next read does not block
/// - the index went backwards (registry restore/reset): start over
/// - an index of 0 would make every read return at once, so use 1
pub fn next_index(previous: Option<u64>, observed: Option<u64>) -> Option<u64> {
    let observed = observed?;
    match previous {
        Some(prev) if observed < prev => None,
        _ => Some(observed.max(1)),
    }
}
