//! Info command implementation.
//!
//! Prints a stream's metadata and schema.

use anyhow::Result;

use crate::display::{build_hub, open_stream};

pub(crate) async fn show_info(
    api_key: &Option<String>,
    base_url: &Option<String>,
    stream: &str,
    label: bool,
) -> Result<()> {
    let hub = build_hub(api_key, base_url)?;
    let stream = open_stream(&hub, stream, label).await?;
    let meta = stream.metadata().await?;

    println!("Stream:      {}", meta.name);
    println!("Key:         {}", meta.key);
    if let Some(unique_label) = &meta.unique_label {
        println!("Label:       {unique_label}");
    }
    if let Some(description) = meta.description.en() {
        println!("Description: {description}");
    }
    if let Some(source) = &meta.source {
        println!(
            "Source:      {} ({})",
            source.label.as_deref().unwrap_or("-"),
            source.key
        );
    }
    if let Some(entry_count) = meta.entry_count() {
        println!("Rows:        {entry_count}");
    }
    if let Some(columns) = meta.meta.main_property_count {
        println!("Columns:     {columns}");
    }
    if let Some(version) = &meta.data_version {
        println!("Version:     {version}");
    }
    if let Some(updated) = &meta.data_updated_at {
        println!("Updated:     {updated}");
    }

    if !meta.data_item_collections.is_empty() {
        println!("\nSchema:");
        println!("{:<32} {:<16}", "NAME", "TYPE");
        println!("{}", "-".repeat(48));
        for field in &meta.data_item_collections {
            println!(
                "{:<32} {:<16}",
                field.name,
                field.basic_data_type.as_deref().unwrap_or("-")
            );
        }
    }

    Ok(())
}
