use super::table;
use anyhow::Result;
use catalog_client::{Client, QueryOptions};
use std::time::Duration;
use tracing::{info, warn};

/// Pause before re-issuing a lookup that failed below the HTTP layer
const RETRY_DELAY: Duration = Duration::from_secs(2);

pub async fn run(client: &Client, service: &str, options: QueryOptions) -> Result<()> {
    println!("Watching '{}' - Press Ctrl+C to exit\n", service);

    let mut watch = client.watch(service, options);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch");
                return Ok(());
            }
            update = watch.next() => match update {
                Ok(update) if update.changed => {
                    println!("{}", table::entries(&update.entries));
                    println!("{}\n", table::meta_line(&update.meta));
                }
                Ok(_) => {}
                Err(e) if e.is_retryable() => {
                    warn!("Lookup failed, retrying in {:?}: {}", RETRY_DELAY, e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
