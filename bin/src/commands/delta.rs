//! Delta command implementation.
//!
//! Downloads rows added after a given data version.

use anyhow::{Context, Result};
use std::path::PathBuf;
use strata_lib::prelude::*;

use crate::display::{Format, build_hub, confirm_overwrite, open_stream, write_records};

#[allow(clippy::too_many_arguments)]
pub(crate) async fn delta(
    api_key: &Option<String>,
    base_url: &Option<String>,
    stream: &str,
    label: bool,
    version: &str,
    live: bool,
    output: Option<PathBuf>,
    format: Format,
    yes: bool,
) -> Result<()> {
    let version: DataVersion = version
        .parse()
        .with_context(|| format!("Invalid data version: {version}"))?;

    let hub = build_hub(api_key, base_url)?;
    let stream = open_stream(&hub, stream, label).await?;
    let records = stream.delta_data(&version, live).await?;

    if records.is_empty() {
        println!("No rows newer than {version}.");
        return Ok(());
    }

    match output {
        Some(path) => {
            if !confirm_overwrite(&path, yes)? {
                println!("Aborted.");
                return Ok(());
            }
            write_records(&records, &path, format)?;
            println!("{} rows written to: {}", records.len(), path.display());
        }
        None => {
            serde_json::to_writer_pretty(std::io::stdout().lock(), &records)?;
            println!();
        }
    }

    Ok(())
}
