//! Data Stream resource operations for the Strata client.
//!
//! A [`DataStream`] is a handle on one stream of the platform:
//!
//! - [`DataStream::metadata`] / [`DataStream::schema`] - stream metadata
//! - [`DataStream::get_data`] - concurrent, cached page download
//! - [`DataStream::delta_data`] - rows added since a data version
//! - [`DataStream::update_data`] / [`create_stream`] / [`upsert_stream`] -
//!   uploads

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod data;
mod delta;
mod handle;
mod upload;

pub use data::{DataQuery, PageBatch, SYSTEM_FIELDS, effective_fields};
pub use handle::{DataStream, resolve_label};
pub use upload::{
    Provision, ReplaceOptions, Scope, StreamDefinition, UPLOAD_CHUNK_ROWS, UpsertKind,
    UpsertOutcome, create_stream, upsert_stream,
};
