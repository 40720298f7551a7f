//! Display utilities and output formatting for the strata CLI.

use anyhow::Result;
use clap::ValueEnum;
use inquire::Confirm;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use strata_lib::prelude::*;
use tracing::debug;

/// Output format for downloaded data.
#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum Format {
    Csv,
    Json,
    Ndjson,
    Parquet,
}

impl Format {
    /// Returns the file extension for this format.
    pub(crate) const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
            Self::Parquet => "parquet",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Write records to a file in the specified format.
pub(crate) fn write_records(records: &[Record], output: &Path, format: Format) -> Result<()> {
    let file = File::create(output)?;
    let writer = BufWriter::new(file);

    match format {
        Format::Csv => {
            let formatter = CsvFormatter::new();
            formatter.write_records(records, writer)?;
        }
        Format::Json => {
            let formatter = JsonFormatter::new();
            formatter.write_records(records, writer)?;
        }
        Format::Ndjson => {
            let formatter = JsonFormatter::ndjson();
            formatter.write_records(records, writer)?;
        }
        Format::Parquet => {
            #[cfg(feature = "parquet")]
            {
                let formatter = ParquetFormatter::new();
                formatter.write_records(records, writer)?;
            }
            #[cfg(not(feature = "parquet"))]
            {
                anyhow::bail!("Parquet support not compiled in");
            }
        }
    }

    Ok(())
}

/// Asks before overwriting an existing output file, unless `yes` is set.
pub(crate) fn confirm_overwrite(path: &Path, yes: bool) -> Result<bool> {
    if yes || !path.exists() {
        return Ok(true);
    }
    let answer = Confirm::new(&format!("{} exists. Overwrite?", path.display()))
        .with_default(false)
        .prompt()?;
    Ok(answer)
}

/// Builds the client configuration from CLI overrides and the environment.
pub(crate) fn client_config(
    api_key: &Option<String>,
    base_url: &Option<String>,
) -> Result<ClientConfig> {
    let mut config = match api_key {
        Some(key) => ClientConfig::new(key.clone()),
        None => ClientConfig::from_env()?,
    };
    if let Some(url) = base_url {
        config = config.with_base_url(url.clone());
    }
    debug!(base_url = %config.base_url, concurrency = config.concurrency, "client configured");
    Ok(config)
}

/// Builds the hub from CLI overrides.
pub(crate) fn build_hub(api_key: &Option<String>, base_url: &Option<String>) -> Result<Strata> {
    Ok(Strata::new(client_config(api_key, base_url)?)?)
}

/// Opens a stream handle by key, or by unique label with `label` set.
pub(crate) async fn open_stream(hub: &Strata, stream: &str, label: bool) -> Result<DataStream> {
    if label {
        Ok(hub.data_stream_by_label(stream).await?)
    } else {
        Ok(hub.data_stream(stream))
    }
}

/// Parses a `name=value` pair into an invocation parameter. The value is
/// parsed as JSON where possible, so `limit=5` becomes a number, and falls
/// back to a plain string otherwise.
pub(crate) fn parse_param(raw: &str) -> Result<InvokeParameter> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected name=value, got `{raw}`"))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok(InvokeParameter::new(name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param_json_value() {
        let param = parse_param("limit=5").unwrap();
        assert_eq!(param.name, "limit");
        assert_eq!(param.value, serde_json::json!(5));
    }

    #[test]
    fn test_parse_param_string_fallback() {
        let param = parse_param("address_string=Hauptstr. 1").unwrap();
        assert_eq!(param.value, serde_json::json!("Hauptstr. 1"));
    }

    #[test]
    fn test_parse_param_rejects_bare_name() {
        assert!(parse_param("no_equals").is_err());
    }
}
