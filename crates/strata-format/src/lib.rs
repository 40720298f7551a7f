//! Output formatters for the Strata data platform client.
//!
//! This crate writes dynamic stream records to a choice of formats:
//!
//! - [`CsvFormatter`] - delimited text with a header row
//! - [`JsonFormatter`] - a JSON array, or NDJSON
//! - [`ParquetFormatter`] - Apache Parquet with an inferred schema
//!
//! [`export`] lays fetched pages out as part files on disk.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod csv;
pub mod export;
mod formatter;
mod json;

#[cfg(feature = "parquet")]
mod parquet;

pub use crate::csv::CsvFormatter;
pub use formatter::{FormatError, Formatter, OutputFormat};
pub use json::{JsonFormatter, JsonStyle};

#[cfg(feature = "parquet")]
pub use crate::parquet::ParquetFormatter;
