//! Client for a service catalog and its local agent
//!
//! This crate looks up registered service instances, registers new ones and
//! removes them, speaking the catalog/agent HTTP API. Reads support the
//! registry's blocking-query protocol: pass the index from one read into the
//! next and the registry holds the request open until something changes.
//!
//! # Architecture
//!
//! - [`QueryEngine`] executes reads and pairs each body with its
//!   [`QueryMeta`] (consistency index, leader contact).
//! - [`CatalogReader`] decodes catalog responses into [`ServiceEntry`] values.
//! - [`RegistrationWriter`] submits register/deregister mutations.
//! - All of them talk through the [`Transport`] trait. [`HttpTransport`] is
//!   the reqwest implementation; [`MemoryTransport`] replays scripted
//!   replies.
//!
//! The engine keeps no state between calls. Retry policy belongs to the
//! caller: [`Error::is_retryable`] tells transport failures apart from
//! registry answers.
//!
//! # Example
//!
//! ```no_run
//! use catalog_client::{Client, ClientConfig, QueryOptions, Scope};
//! use std::time::Duration;
//!
//! # async fn example() -> catalog_client::Result<()> {
//! let client = Client::connect(ClientConfig::default()).await?;
//!
//! let (web, meta) = client
//!     .lookup("web", Scope::All, &QueryOptions::new())
//!     .await?
//!     .into_parts();
//! println!("{} instances", web.into_entries().len());
//!
//! // Wait up to 30s for the set of instances to change
//! let options = QueryOptions::new()
//!     .with_wait(Duration::from_secs(30))
//!     .after(&meta);
//! let (changed, _) = client.lookup("web", Scope::All, &options).await?.into_parts();
//! # let _ = changed;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod agent;
pub mod blocking;
pub mod catalog;
pub mod client;
pub mod config;
pub mod duration;
pub mod error;
pub mod facade;
pub mod models;
pub mod query;
pub mod transport;
pub mod watch;

pub use agent::RegistrationWriter;
pub use blocking::{QueryEngine, QueryResponse};
pub use catalog::{CatalogReader, Lookup, Scope};
pub use client::Client;
pub use config::{ClientConfig, ClientTlsConfig};
pub use error::{Error, Result};
pub use models::*;
pub use query::{Consistency, QueryMeta, QueryOptions};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, MemoryTransport, Method, Transport};
pub use watch::{CatalogWatch, WatchUpdate};

/// Re-export key types for convenience
pub mod prelude {
    pub use crate::{
        CatalogReader,
        Client,
        ClientConfig,
        Consistency,
        Error,
        Lookup,
        QueryMeta,
        QueryOptions,
        RegistrationSpec,
        RegistrationWriter,
        Result,
        Scope,
        ServiceEntry,
    };
}
