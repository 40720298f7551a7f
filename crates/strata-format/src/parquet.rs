//! Apache Parquet output with schema inference.

use arrow::datatypes::Schema;
use arrow::json::reader::{ReaderBuilder, infer_json_schema_from_iterator};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use strata_types::Record;

use crate::{FormatError, Formatter};

/// Writes records as an Apache Parquet file.
///
/// Records carry no static schema, so one is inferred from the records
/// themselves before writing.
#[derive(Debug, Clone)]
pub struct ParquetFormatter {
    /// Rows per row group.
    row_group_size: usize,
    /// Page compression codec.
    compression: Compression,
}

impl Default for ParquetFormatter {
    fn default() -> Self {
        Self {
            row_group_size: 100_000,
            compression: Compression::SNAPPY,
        }
    }
}

impl ParquetFormatter {
    /// A formatter with Snappy compression and 100k-row groups.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of rows per row group.
    #[must_use]
    pub const fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Sets the page compression codec.
    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Infers the Arrow schema from the records.
    fn infer_schema(records: &[Record]) -> Result<Schema, FormatError> {
        if records.is_empty() {
            return Ok(Schema::empty());
        }
        infer_json_schema_from_iterator(records.iter().map(|r| Ok(Value::Object(r.clone()))))
            .map_err(|e| FormatError::Parquet(e.to_string()))
    }
}

impl Formatter for ParquetFormatter {
    fn write_records<W: Write + Send>(
        &self,
        records: &[Record],
        writer: W,
    ) -> Result<(), FormatError> {
        let schema = Arc::new(Self::infer_schema(records)?);
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut arrow_writer = ArrowWriter::try_new(writer, Arc::clone(&schema), Some(props))
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        for chunk in records.chunks(self.row_group_size) {
            let mut decoder = ReaderBuilder::new(Arc::clone(&schema))
                .build_decoder()
                .map_err(|e| FormatError::Parquet(e.to_string()))?;
            decoder
                .serialize(chunk)
                .map_err(|e| FormatError::Parquet(e.to_string()))?;
            if let Some(batch) = decoder
                .flush()
                .map_err(|e| FormatError::Parquet(e.to_string()))?
            {
                arrow_writer
                    .write(&batch)
                    .map_err(|e| FormatError::Parquet(e.to_string()))?;
            }
        }

        arrow_writer
            .close()
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        Ok(())
    }

    fn extension(&self) -> &str {
        "parquet"
    }
}
