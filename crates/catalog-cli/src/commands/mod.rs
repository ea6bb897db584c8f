use catalog_client::{Consistency, QueryOptions};

pub mod deregister;
pub mod lookup;
pub mod register;
pub mod watch;

mod table;

/// Options shared by every read command
pub fn read_options(dc: Option<String>, consistency: Consistency) -> QueryOptions {
    let mut options = QueryOptions::new().with_consistency(consistency);
    if let Some(dc) = dc {
        options = options.with_datacenter(dc);
    }
    options
}
