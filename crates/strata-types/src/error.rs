//! Error types for the Strata client.

use serde::Deserialize;
use thiserror::Error;

/// Result type alias for Strata client operations.
pub type Result<T> = std::result::Result<T, StrataError>;

/// Errors that can occur while talking to the Strata platform.
#[derive(Error, Debug)]
pub enum StrataError {
    /// HTTP transport failed (connection, timeout, decode).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API rejected the request with a structured error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A request parameter failed local validation.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Client configuration problem (missing API key, bad base URL).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The stream metadata carries no entry count, so a page plan cannot
    /// be derived.
    #[error("Stream {0} has no entry count in its metadata")]
    MissingEntryCount(String),

    /// A destructive replace was attempted without confirmation.
    #[error("Replace is destructive and must be confirmed with `force`")]
    ReplaceNotConfirmed,

    /// Local cache read or write failed.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Output formatting failed.
    #[error("Format error: {0}")]
    Format(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Structured errors returned by the Strata API.
///
/// Non-2xx responses carry a `{"detail": [{"msg": ..., "type": ...}]}`
/// envelope; each known message/type pair maps to one variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The requested data stream does not exist.
    #[error("Data stream does not exist")]
    StreamNotFound,

    /// The requested data service does not exist.
    #[error("Data service does not exist")]
    ServiceNotFound,

    /// The requested data version does not exist.
    #[error("Data version does not exist")]
    VersionNotFound,

    /// The API key is valid but lacks access to the resource.
    #[error("Not authorized to access this resource")]
    NotAuthorized,

    /// The API key is missing or invalid.
    #[error("Could not validate credentials")]
    Unauthenticated,

    /// The account has no data streams at all.
    #[error("No data streams found")]
    NoStreamsFound,

    /// The uploaded data cannot be used to create a stream.
    #[error("Input data is not supported for creating a data stream")]
    UnsupportedInput,

    /// A stream with the same unique label already exists.
    #[error("A data stream with this unique label already exists")]
    UniqueLabelConflict,

    /// Rollback to the given version is not possible.
    #[error("Cannot rollback to this data version")]
    UnsupportedRollback,

    /// The recovery secret is invalid.
    #[error("The provided recovery secret is invalid")]
    InvalidRecoverySecret,

    /// The server rejected request parameters (e.g. sort options).
    #[error("Invalid request parameters: {0}")]
    InvalidParameters(String),

    /// Generic server-side failure.
    #[error("Server error, try again later")]
    Server,

    /// The error envelope was present but the message/type pair is unknown.
    #[error("Unrecognized API error ({error_type}): {message}")]
    Unrecognized {
        /// The `type` field of the error detail.
        error_type: String,
        /// The `msg` field of the error detail.
        message: String,
    },

    /// Non-success status without a parseable error envelope.
    #[error("Unexpected HTTP status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
}

/// The error envelope the API wraps failures in.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    /// The list of error details, usually exactly one.
    pub detail: Vec<ErrorDetail>,
}

/// A single entry of the error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable message.
    pub msg: String,
    /// Machine-readable error type, e.g. `data_warning.empty`.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Location of the offending input, if any.
    #[serde(default)]
    pub loc: serde_json::Value,
}
