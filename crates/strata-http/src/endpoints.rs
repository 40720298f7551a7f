//! REST path and query construction for the Strata API.
//!
//! Paths are relative to the configured base URL; query parameters are
//! returned as pairs so the client can let reqwest do the encoding.

use strata_types::{DataVersion, Key, PageRange};

/// Metadata of a stream: `/data-stream/get/{key}/meta`.
#[must_use]
pub fn stream_meta(key: &Key) -> String {
    format!("/data-stream/get/{key}/meta")
}

/// Key lookup by unique label: `/data-stream/get/label/{label}`.
#[must_use]
pub fn stream_by_label(label: &str) -> String {
    format!("/data-stream/get/label/{label}")
}

/// Page data of a stream: `/data-stream/get/{key}`.
#[must_use]
pub fn stream_data(key: &Key) -> String {
    format!("/data-stream/get/{key}")
}

/// Query parameters for a page request.
#[must_use]
pub fn stream_data_query(range: PageRange, fields: &[String]) -> Vec<(String, String)> {
    let mut query = vec![
        ("skip".to_string(), range.skip.to_string()),
        ("limit".to_string(), range.rows.to_string()),
    ];
    for field in fields {
        query.push(("fields".to_string(), field.clone()));
    }
    query
}

/// Delta rows since a version: `/data-stream/get/delta/{key}/{version}`.
#[must_use]
pub fn stream_delta(key: &Key, version: &DataVersion) -> String {
    format!("/data-stream/get/delta/{key}/{version}")
}

/// Stream creation: `/data-stream/new`.
#[must_use]
pub const fn stream_new() -> &'static str {
    "/data-stream/new"
}

/// Appending rows: `/data-stream/add/data`.
#[must_use]
pub const fn stream_add_data() -> &'static str {
    "/data-stream/add/data"
}

/// Replacing data: `/data-stream/replace`.
#[must_use]
pub const fn stream_replace() -> &'static str {
    "/data-stream/replace"
}

/// Metadata patching: `/data-stream/meta/update`.
#[must_use]
pub const fn stream_meta_update() -> &'static str {
    "/data-stream/meta/update"
}

/// Source assignment: `/data-stream/meta/set-source`.
#[must_use]
pub const fn stream_set_source() -> &'static str {
    "/data-stream/meta/set-source"
}

/// Metadata of a service: `/data-service/get/{key}`.
#[must_use]
pub fn service_get(key: &Key) -> String {
    format!("/data-service/get/{key}")
}

/// Service invocation: `/data-service/invoke`.
#[must_use]
pub const fn service_invoke() -> &'static str {
    "/data-service/invoke"
}

/// All data sources: `/data-source/get/all`.
#[must_use]
pub const fn sources_all() -> &'static str {
    "/data-source/get/all"
}

/// All stream collections: `/data-stream-collections/list/all`.
#[must_use]
pub const fn collections_all() -> &'static str {
    "/data-stream-collections/list/all"
}

/// Collection creation: `/data-stream-collection/create`.
#[must_use]
pub const fn collection_create() -> &'static str {
    "/data-stream-collection/create"
}

/// Adding streams to a collection: `/data-stream-collection/add/data-streams`.
#[must_use]
pub const fn collection_add_streams() -> &'static str {
    "/data-stream-collection/add/data-streams"
}
