//! JSON and NDJSON output.

use std::io::Write;

use strata_types::Record;

use crate::{FormatError, Formatter};

/// JSON output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// A single JSON array holding all records.
    #[default]
    Array,
    /// One JSON object per line (NDJSON/JSONL).
    Ndjson,
}

/// Writes records as a JSON array or as newline-delimited JSON.
///
/// Records are dynamic maps, so the output mirrors the stream's own field
/// names and nesting; nothing is renamed or reordered.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    style: JsonStyle,
    /// Pretty-printing applies to the array style only.
    pretty: bool,
}

impl JsonFormatter {
    /// Compact JSON array output.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            style: JsonStyle::Array,
            pretty: false,
        }
    }

    /// Newline-delimited output, one record per line.
    #[must_use]
    pub const fn ndjson() -> Self {
        Self {
            style: JsonStyle::Ndjson,
            pretty: false,
        }
    }

    /// Sets the output style.
    #[must_use]
    pub const fn with_style(mut self, style: JsonStyle) -> Self {
        self.style = style;
        self
    }

    /// Enables or disables pretty-printing (array style only).
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn write_array<W: Write>(
        &self,
        records: &[Record],
        writer: &mut W,
    ) -> Result<(), FormatError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, records)?;
        } else {
            writer.write_all(b"[")?;
            for (index, record) in records.iter().enumerate() {
                if index > 0 {
                    writer.write_all(b",")?;
                }
                serde_json::to_writer(&mut *writer, record)?;
            }
            writer.write_all(b"]")?;
        }
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl Formatter for JsonFormatter {
    fn write_records<W: Write + Send>(
        &self,
        records: &[Record],
        mut writer: W,
    ) -> Result<(), FormatError> {
        match self.style {
            JsonStyle::Array => self.write_array(records, &mut writer),
            JsonStyle::Ndjson => {
                for record in records {
                    serde_json::to_writer(&mut writer, record)?;
                    writer.write_all(b"\n")?;
                }
                Ok(())
            }
        }
    }

    fn extension(&self) -> &str {
        match self.style {
            JsonStyle::Array => "json",
            JsonStyle::Ndjson => "ndjson",
        }
    }
}
