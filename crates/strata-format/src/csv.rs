//! CSV output format.

use serde_json::Value;
use std::io::Write;
use strata_types::Record;

use crate::{FormatError, Formatter};

/// CSV formatter.
///
/// Columns are the union of all record keys in first-appearance order, so
/// records with differing shapes land in one consistent table. Nested
/// values (arrays, objects) are serialized as JSON into their cell.
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    /// Field delimiter (default: comma).
    delimiter: char,
    /// Whether to include header row.
    include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFormatter {
    /// Creates a new CSV formatter with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: ',',
            include_header: true,
        }
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether to include a header row.
    #[must_use]
    pub const fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Creates a tab-separated values (TSV) formatter.
    #[must_use]
    pub const fn tsv() -> Self {
        Self {
            delimiter: '\t',
            include_header: true,
        }
    }

    /// Union of all record keys, in first-appearance order.
    fn columns(records: &[Record]) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key);
                }
            }
        }
        columns
    }

    /// Renders a cell value: strings raw, scalars via Display, nested
    /// values as JSON, absent or null as empty.
    fn cell(value: Option<&Value>) -> Result<String, FormatError> {
        Ok(match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(nested) => serde_json::to_string(nested)?,
        })
    }

    /// Quotes a cell if it contains the delimiter, a quote, or a newline.
    fn escape(&self, cell: &str) -> String {
        if cell.contains(self.delimiter)
            || cell.contains('"')
            || cell.contains('\n')
            || cell.contains('\r')
        {
            format!("\"{}\"", cell.replace('"', "\"\""))
        } else {
            cell.to_string()
        }
    }

    fn write_row<W: Write>(
        &self,
        writer: &mut W,
        cells: impl Iterator<Item = String>,
    ) -> Result<(), FormatError> {
        let delimiter = self.delimiter.to_string();
        let row: Vec<String> = cells.map(|c| self.escape(&c)).collect();
        writeln!(writer, "{}", row.join(&delimiter))?;
        Ok(())
    }
}

impl Formatter for CsvFormatter {
    fn write_records<W: Write + Send>(
        &self,
        records: &[Record],
        mut writer: W,
    ) -> Result<(), FormatError> {
        let columns = Self::columns(records);
        if columns.is_empty() {
            return Ok(());
        }

        if self.include_header {
            self.write_row(&mut writer, columns.iter().map(ToString::to_string))?;
        }

        for record in records {
            let cells: Result<Vec<String>, FormatError> = columns
                .iter()
                .map(|column| Self::cell(record.get(*column)))
                .collect();
            self.write_row(&mut writer, cells?.into_iter())?;
        }

        Ok(())
    }

    fn extension(&self) -> &str {
        "csv"
    }
}
