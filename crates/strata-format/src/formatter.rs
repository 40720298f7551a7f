//! The formatter trait and the set of supported output formats.

use std::io::Write;
use strata_types::Record;
use thiserror::Error;

/// The output formats a record set can be rendered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Comma-separated values with a header row.
    #[default]
    Csv,
    /// A single JSON array.
    Json,
    /// Newline-delimited JSON, one record per line.
    Ndjson,
    /// Apache Parquet with an inferred schema.
    Parquet,
}

impl OutputFormat {
    /// The canonical file extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
            Self::Parquet => "parquet",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = FormatError;

    /// Parses a format name or a common alias (`jsonl`, `pq`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            "parquet" | "pq" => Ok(Self::Parquet),
            _ => Err(FormatError::UnknownFormat(s.to_string())),
        }
    }
}

/// Errors raised while rendering records.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The requested format name is not recognized.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// The underlying writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema inference or the Parquet writer failed.
    #[error("Parquet error: {0}")]
    Parquet(String),
}

/// Renders a slice of records to a byte sink.
///
/// Records have no static schema; each formatter derives its layout from
/// the records it is given.
pub trait Formatter: Send + Sync {
    /// Writes all records to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the writer fails.
    fn write_records<W: Write + Send>(
        &self,
        records: &[Record],
        writer: W,
    ) -> Result<(), FormatError>;

    /// The file extension this formatter produces.
    fn extension(&self) -> &str;
}
