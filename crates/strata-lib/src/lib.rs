//! Rust client library for the Strata data platform.
//!
//! This is a facade crate that re-exports functionality from the strata
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use strata_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let strata = Strata::from_env()?;
//!
//!     let stream = strata.data_stream_by_label("de_companies").await?;
//!     let records = stream.get_data(&DataQuery::new()).await?;
//!     println!("Downloaded {} rows", records.len());
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

#[cfg(all(feature = "stream", feature = "service"))]
mod hub;

// Re-export core types
pub use strata_types::*;

// Re-export the HTTP layer
pub use strata_http::{ApiClient, CacheDir, ClientConfig, DEFAULT_BASE_URL, api_key_from_env};

// Re-export stream operations
#[cfg(feature = "stream")]
pub use strata_stream::{
    DataQuery, DataStream, PageBatch, Provision, ReplaceOptions, SYSTEM_FIELDS, Scope,
    StreamDefinition, UPLOAD_CHUNK_ROWS, UpsertKind, UpsertOutcome, create_stream, resolve_label,
    upsert_stream,
};

// Re-export service operations
#[cfg(feature = "service")]
pub use strata_service::{DataService, InputMapping};

// Re-export formatters
#[cfg(feature = "format")]
pub use strata_format::{
    CsvFormatter, FormatError, Formatter, JsonFormatter, OutputFormat, export,
};

#[cfg(all(feature = "format", feature = "parquet"))]
pub use strata_format::ParquetFormatter;

#[cfg(all(feature = "stream", feature = "service"))]
pub use hub::Strata;

/// Prelude module for convenient imports.
///
/// ```
/// use strata_lib::prelude::*;
/// ```
pub mod prelude {
    pub use strata_http::{ApiClient, CacheDir, ClientConfig};
    pub use strata_types::{
        ApiError, DataVersion, InvokeParameter, Key, Record, Result, StrataError,
    };

    #[cfg(feature = "stream")]
    pub use strata_stream::{DataQuery, DataStream, StreamDefinition, upsert_stream};

    #[cfg(feature = "service")]
    pub use strata_service::{DataService, InputMapping};

    #[cfg(feature = "format")]
    pub use strata_format::{CsvFormatter, Formatter, JsonFormatter, OutputFormat};

    #[cfg(all(feature = "format", feature = "parquet"))]
    pub use strata_format::ParquetFormatter;

    #[cfg(all(feature = "stream", feature = "service"))]
    pub use crate::hub::Strata;
}
