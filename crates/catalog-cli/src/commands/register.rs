use anyhow::{Context, Result};
use catalog_client::{Client, RegistrationSpec};
use std::path::Path;

pub async fn run(client: &Client, file: &Path) -> Result<()> {
    let spec = RegistrationSpec::from_file(file)
        .await
        .with_context(|| format!("Failed to load definition from {}", file.display()))?;

    client
        .register(&spec)
        .await
        .with_context(|| format!("Failed to register '{}'", spec.service_id()))?;

    println!("✓ Registered {} ({})", spec.name, spec.service_id());
    Ok(())
}
