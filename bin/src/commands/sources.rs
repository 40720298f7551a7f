//! Sources command implementation.
//!
//! Lists all data sources visible to the account.

use anyhow::Result;

use crate::display::build_hub;

pub(crate) async fn list_sources(
    api_key: &Option<String>,
    base_url: &Option<String>,
) -> Result<()> {
    let hub = build_hub(api_key, base_url)?;
    let mut sources = hub.list_sources().await?;
    sources.sort_by(|a, b| a.label.cmp(&b.label));

    println!("{:<12} {:<28} {}", "KEY", "LABEL", "NAME");
    println!("{}", "-".repeat(72));
    for source in &sources {
        println!(
            "{:<12} {:<28} {}",
            source.key,
            source.label.as_deref().unwrap_or("-"),
            source.name
        );
    }
    println!("\n{} sources", sources.len());

    Ok(())
}
