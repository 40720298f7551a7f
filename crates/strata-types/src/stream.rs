//! Data stream metadata models.

use serde::Deserialize;

use crate::{DataVersion, Key, LocalizedText};

/// Metadata of a data stream, as returned by `/data-stream/get/{key}/meta`.
///
/// The server may add fields over time; unknown fields are ignored and
/// optional ones tolerate absence.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamMetadata {
    /// The stream key.
    #[serde(rename = "_key")]
    pub key: Key,
    /// The unique, human-readable label.
    #[serde(default)]
    pub unique_label: Option<String>,
    /// Localized stream name.
    #[serde(default)]
    pub name: LocalizedText,
    /// Localized stream description.
    #[serde(default)]
    pub description: LocalizedText,
    /// Row/column statistics.
    #[serde(default)]
    pub meta: StreamStats,
    /// The source this stream is fed from.
    #[serde(default)]
    pub source: Option<SourceRef>,
    /// Field definitions of the stream schema.
    #[serde(default)]
    pub data_item_collections: Vec<FieldDefinition>,
    /// Current data version.
    #[serde(default)]
    pub data_version: Option<DataVersion>,
    /// Store layout version.
    #[serde(default)]
    pub store_version: Option<String>,
    /// When the data was last updated. Kept verbatim; the server's
    /// timestamp format is not part of the documented contract.
    #[serde(default)]
    pub data_updated_at: Option<String>,
    /// Creation timestamp, verbatim.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last metadata update timestamp, verbatim.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl StreamMetadata {
    /// Returns the number of rows, if the server reported it.
    #[must_use]
    pub const fn entry_count(&self) -> Option<u64> {
        self.meta.entry_count
    }
}

/// Row and column counts of a stream.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StreamStats {
    /// Total number of rows. Recomputed by the server on each request.
    #[serde(default)]
    pub entry_count: Option<u64>,
    /// Number of data columns, excluding system columns.
    #[serde(default)]
    pub main_property_count: Option<u64>,
}

/// Reference to the data source feeding a stream or service.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRef {
    /// The source key.
    #[serde(rename = "_key")]
    pub key: Key,
    /// The source label.
    #[serde(default)]
    pub label: Option<String>,
}

/// A single field of a stream schema.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDefinition {
    /// The field key.
    #[serde(rename = "_key")]
    pub key: Key,
    /// The column name.
    pub name: String,
    /// The platform's basic data type for the column.
    #[serde(default)]
    pub basic_data_type: Option<String>,
    /// Localized field definition text.
    #[serde(default)]
    pub definition: Option<LocalizedText>,
}

/// Response of the label lookup endpoint: only the key is relevant.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelRef {
    /// The key of the stream carrying the label.
    #[serde(rename = "_key")]
    pub key: Key,
}

/// Receipt returned for create/update/replace uploads.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertReceipt {
    /// The key of the affected stream.
    #[serde(rename = "_key")]
    pub key: Key,
}

/// A stream collection, as listed by `/data-stream-collections/list/all`.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionInfo {
    /// The collection key.
    #[serde(rename = "_key")]
    pub key: Key,
    /// The collection name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A data source, as listed by `/data-source/get/all`.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceInfo {
    /// The source key.
    #[serde(rename = "_key")]
    pub key: Key,
    /// The source label.
    #[serde(default)]
    pub label: Option<String>,
    /// Localized source name.
    #[serde(default)]
    pub name: LocalizedText,
    /// Primary URI of the source.
    #[serde(default)]
    pub primary_uri: Option<String>,
}
