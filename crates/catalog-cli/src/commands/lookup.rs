use super::table;
use crate::Format;
use anyhow::{Context, Result};
use catalog_client::{Client, QueryOptions, Scope};

pub async fn run(
    client: &Client,
    service: &str,
    all: bool,
    options: &QueryOptions,
    format: Format,
) -> Result<()> {
    let scope = if all { Scope::All } else { Scope::First };
    let (lookup, meta) = client
        .lookup(service, scope, options)
        .await
        .with_context(|| format!("Lookup of '{}' failed", service))?
        .into_parts();
    let entries = lookup.into_entries();

    match format {
        Format::Json => {
            let output = serde_json::json!({
                "entries": entries,
                "meta": meta,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Format::Table => {
            println!("{}", table::entries(&entries));
            println!("{}", table::meta_line(&meta));
        }
    }

    Ok(())
}
