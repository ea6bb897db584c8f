use anyhow::{Context, Result};
use catalog_client::Client;

pub async fn run(client: &Client, id: &str) -> Result<()> {
    client
        .deregister(id)
        .await
        .with_context(|| format!("Failed to deregister '{}'", id))?;

    println!("✓ Deregistered {}", id);
    Ok(())
}
