//! Download command implementation.
//!
//! Fetches stream data page by page and writes it to a file or a part
//! file layout.

use anyhow::Result;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use strata_lib::export;
use strata_lib::prelude::*;

use crate::display::{Format, confirm_overwrite, open_stream, write_records};

pub(crate) struct DownloadArgs {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub stream: String,
    pub label: bool,
    pub fields: Vec<String>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub live: bool,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub format: Format,
    pub concurrency: usize,
    pub yes: bool,
    pub quiet: bool,
}

pub(crate) async fn download(args: DownloadArgs) -> Result<()> {
    let config = crate::display::client_config(&args.api_key, &args.base_url)?
        .with_concurrency(args.concurrency);
    let hub = Strata::new(config)?;
    let stream = open_stream(&hub, &args.stream, args.label).await?;

    let mut query = DataQuery::new().with_fields(args.fields.clone());
    if let (Some(skip), Some(limit)) = (args.skip, args.limit) {
        query = query.with_range(skip, limit);
    }
    if args.live {
        query = query.live();
    }

    let progress = setup_progress(&stream, &query, args.quiet).await;

    let mut pages: Vec<Vec<Record>> = Vec::new();
    let mut skipped_pages = 0u64;
    {
        let mut batches = stream.page_stream_resilient(&query).await?;
        while let Some(batch) = batches.next().await {
            if batch.had_error {
                skipped_pages += 1;
            }
            progress.inc(batch.len() as u64);
            pages.push(batch.records);
        }
    }

    let total_rows: usize = pages.iter().map(Vec::len).sum();
    let finish_msg = if skipped_pages > 0 {
        format!("Downloaded {total_rows} rows ({skipped_pages} pages skipped due to errors)")
    } else {
        format!("Downloaded {total_rows} rows")
    };
    progress.finish_with_message(finish_msg);

    if let Some(dir) = args.output_dir {
        let paths = write_part_files(&dir, stream.key(), &pages, args.format)?;
        if !args.quiet {
            println!("Wrote {} part files under {}", paths.len(), dir.display());
        }
        return Ok(());
    }

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.{}", args.stream, args.format.extension())));
    if !confirm_overwrite(&output, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    let records: Vec<Record> = pages.into_iter().flatten().collect();
    write_records(&records, &output, args.format)?;
    if !args.quiet {
        println!("Output written to: {}", output.display());
    }

    Ok(())
}

/// Row-count progress when the total is known, a spinner otherwise.
async fn setup_progress(stream: &DataStream, query: &DataQuery, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let total = if query.skip.is_some() {
        None
    } else {
        stream
            .metadata()
            .await
            .ok()
            .and_then(|meta| meta.entry_count())
    };
    match total {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) {msg}")
                    .expect("Invalid progress template")
                    .progress_chars("=>-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    }
}

fn write_part_files(
    dir: &std::path::Path,
    key: &Key,
    pages: &[Vec<Record>],
    format: Format,
) -> Result<Vec<PathBuf>> {
    let pages = pages.iter().cloned();
    let paths = match format {
        Format::Csv => export::write_parts(dir, key, &CsvFormatter::new(), pages)?,
        Format::Json => export::write_parts(dir, key, &JsonFormatter::new(), pages)?,
        Format::Ndjson => export::write_parts(dir, key, &JsonFormatter::ndjson(), pages)?,
        Format::Parquet => {
            #[cfg(feature = "parquet")]
            {
                export::write_parts(dir, key, &ParquetFormatter::new(), pages)?
            }
            #[cfg(not(feature = "parquet"))]
            {
                anyhow::bail!("Parquet support not compiled in");
            }
        }
    };
    Ok(paths)
}
