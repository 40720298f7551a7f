//! Core types for the Strata data platform client.
//!
//! This crate provides the fundamental data structures used throughout the
//! client:
//!
//! - [`Key`] - A resource key (streams, services, sources)
//! - [`DataVersion`] - A dataset version identifier
//! - [`LocalizedText`] - Language-keyed text as used by the API
//! - [`StreamMetadata`] / [`ServiceMetadata`] - Resource metadata models
//! - [`Record`] / [`DataPage`] - Row data and the page response envelope
//! - [`PageRange`] - Skip/limit page planning for large result sets

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod key;
mod pages;
mod record;
mod service;
mod stream;
mod text;

pub use error::{ApiError, ErrorDetail, ErrorEnvelope, Result, StrataError};
pub use key::{DataVersion, Key};
pub use pages::{MAX_PAGE_ROWS, PageRange, RESTRIDE_ROWS, plan_pages, stride_pages};
pub use record::{DataPage, Record};
pub use service::{
    InvokeParameter, ParameterDefinition, ParameterSample, ParameterSchema, RequestDefinition,
    ServiceMetadata,
};
pub use stream::{
    CollectionInfo, FieldDefinition, LabelRef, SourceInfo, SourceRef, StreamMetadata, StreamStats,
    UpsertReceipt,
};
pub use text::LocalizedText;
