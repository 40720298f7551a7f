//! Stream creation and data uploads.

use serde::Serialize;
use tracing::info;

use strata_http::{ApiClient, CacheDir, endpoints, evaluate};
use strata_types::{
    ApiError, Key, LocalizedText, Record, Result, StrataError, UpsertReceipt,
};

use crate::{DataStream, resolve_label};

/// Rows per upload request. Larger datasets are split into consecutive
/// requests of this size.
pub const UPLOAD_CHUNK_ROWS: usize = 1_000_000;

/// Who may read a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    /// Readable by everyone.
    #[default]
    Public,
    /// Readable by the owning account only.
    Private,
}

/// How a stream is provisioned on the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provision {
    /// Listed on the data marketplace.
    #[default]
    Marketplace,
    /// Not listed.
    Private,
}

/// Everything needed to create a new stream.
#[derive(Debug, Clone, Serialize)]
pub struct StreamDefinition {
    /// Account-wide unique label of the stream.
    pub unique_label: String,
    /// Localized display name. English is required.
    pub name: LocalizedText,
    /// Localized description. English is required.
    pub description: LocalizedText,
    /// Read scope.
    pub scope: Scope,
    /// Provisioning mode.
    pub provision: Provision,
    /// Key of the data source feeding the stream.
    pub source: String,
}

impl StreamDefinition {
    /// Creates a definition with default scope and provisioning.
    pub fn new(
        unique_label: impl Into<String>,
        name: LocalizedText,
        description: LocalizedText,
        source: impl Into<String>,
    ) -> Self {
        Self {
            unique_label: unique_label.into(),
            name,
            description,
            scope: Scope::default(),
            provision: Provision::default(),
            source: source.into(),
        }
    }

    /// Checks the definition before any request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidParameter`] if the label or source is
    /// blank or the name or description has no English text.
    pub fn validate(&self) -> Result<()> {
        if self.unique_label.trim().is_empty() {
            return Err(StrataError::InvalidParameter(
                "unique_label must not be empty".to_string(),
            ));
        }
        if self.name.en().is_none_or(|n| n.trim().is_empty()) {
            return Err(StrataError::InvalidParameter(
                "name requires an English (`en`) entry".to_string(),
            ));
        }
        if self.description.en().is_none_or(|d| d.trim().is_empty()) {
            return Err(StrataError::InvalidParameter(
                "description requires an English (`en`) entry".to_string(),
            ));
        }
        if self.source.trim().is_empty() {
            return Err(StrataError::InvalidParameter(
                "source must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options for [`DataStream::replace_data`].
#[derive(Debug, Clone, Copy)]
pub struct ReplaceOptions {
    /// Also drop data versions derived from the replaced data.
    pub cascade: bool,
    /// Replace in place instead of writing a new store version.
    pub inplace: bool,
    /// Replace deletes the existing data and must be confirmed.
    pub force: bool,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self {
            cascade: true,
            inplace: false,
            force: false,
        }
    }
}

/// What an upsert ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertKind {
    /// The stream did not exist and was created.
    Created,
    /// Rows were appended to an existing stream.
    Updated,
    /// The stream's data was replaced.
    Replaced,
}

/// Result of an upload operation.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    /// The key of the affected stream.
    pub key: Key,
    /// What the operation did.
    pub kind: UpsertKind,
    /// Number of upload requests sent.
    pub chunks: usize,
}

/// Splits rows into upload-sized chunks, always yielding at least one
/// (possibly empty) chunk.
fn chunks_of(records: &[Record]) -> Vec<&[Record]> {
    if records.is_empty() {
        vec![&[]]
    } else {
        records.chunks(UPLOAD_CHUNK_ROWS).collect()
    }
}

/// Some endpoints answer errors with a 200 carrying the usual error
/// envelope; route those through the classifier before decoding.
fn parse_receipt(value: serde_json::Value) -> Result<UpsertReceipt> {
    if value.get("detail").is_some() {
        let body = value.to_string();
        return Err(evaluate::classify(200, &body).into());
    }
    Ok(serde_json::from_value(value)?)
}

/// Creates a new stream from a definition and its initial rows.
///
/// Rows beyond [`UPLOAD_CHUNK_ROWS`] are appended with follow-up requests
/// after the stream exists.
///
/// # Errors
///
/// Returns an error if the definition fails validation, the label is
/// already taken, or any request fails.
pub async fn create_stream(
    client: &ApiClient,
    definition: &StreamDefinition,
    records: &[Record],
) -> Result<UpsertOutcome> {
    definition.validate()?;

    let chunks = chunks_of(records);
    let mut body = serde_json::to_value(definition)?;
    body["data"] = serde_json::to_value(chunks[0])?;

    let response: serde_json::Value = client
        .post_multipart(
            endpoints::stream_new(),
            &[("data_stream_definition", body.to_string())],
        )
        .await?;
    let receipt = parse_receipt(response)?;
    info!(key = %receipt.key, label = definition.unique_label, "stream created");

    for chunk in &chunks[1..] {
        append_chunk(client, &receipt.key, chunk).await?;
    }

    Ok(UpsertOutcome {
        key: receipt.key,
        kind: UpsertKind::Created,
        chunks: chunks.len(),
    })
}

/// Appends rows to an existing stream, creating it first if the
/// definition's label is unknown.
///
/// # Errors
///
/// Returns an error if the definition fails validation or any request
/// fails.
pub async fn upsert_stream(
    client: &ApiClient,
    cache: &CacheDir,
    definition: &StreamDefinition,
    records: &[Record],
) -> Result<UpsertOutcome> {
    definition.validate()?;

    match resolve_label(client, &definition.unique_label).await {
        Ok(key) => {
            let stream = DataStream::new(client.clone(), cache.clone(), key);
            stream.update_data(records).await
        }
        Err(StrataError::Api(ApiError::StreamNotFound)) => {
            create_stream(client, definition, records).await
        }
        Err(e) => Err(e),
    }
}

async fn append_chunk(client: &ApiClient, key: &Key, chunk: &[Record]) -> Result<UpsertReceipt> {
    let response: serde_json::Value = client
        .post_multipart(
            endpoints::stream_add_data(),
            &[
                ("key", key.to_string()),
                ("data", serde_json::to_string(chunk)?),
            ],
        )
        .await?;
    parse_receipt(response)
}

impl DataStream {
    /// Appends rows to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream does not exist, the rows are not
    /// accepted, or any request fails.
    pub async fn update_data(&self, records: &[Record]) -> Result<UpsertOutcome> {
        let chunks = chunks_of(records);
        for chunk in &chunks {
            append_chunk(&self.client, self.key(), chunk).await?;
        }
        info!(key = %self.key(), rows = records.len(), requests = chunks.len(), "rows appended");

        Ok(UpsertOutcome {
            key: self.key().clone(),
            kind: UpsertKind::Updated,
            chunks: chunks.len(),
        })
    }

    /// Replaces the stream's data with the given rows.
    ///
    /// This deletes the existing data and requires
    /// [`ReplaceOptions::force`].
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ReplaceNotConfirmed`] without `force`, or an
    /// error if any request fails.
    pub async fn replace_data(
        &self,
        records: &[Record],
        options: &ReplaceOptions,
    ) -> Result<UpsertOutcome> {
        if !options.force {
            return Err(StrataError::ReplaceNotConfirmed);
        }

        let chunks = chunks_of(records);
        let response: serde_json::Value = self
            .client
            .post_multipart(
                endpoints::stream_replace(),
                &[
                    ("key", self.key().to_string()),
                    ("inplace", options.inplace.to_string()),
                    ("cascade", options.cascade.to_string()),
                    ("data", serde_json::to_string(chunks[0])?),
                ],
            )
            .await?;
        parse_receipt(response)?;

        for chunk in &chunks[1..] {
            append_chunk(&self.client, self.key(), chunk).await?;
        }
        info!(key = %self.key(), rows = records.len(), "stream data replaced");

        Ok(UpsertOutcome {
            key: self.key().clone(),
            kind: UpsertKind::Replaced,
            chunks: chunks.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_http::ClientConfig;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn definition() -> StreamDefinition {
        StreamDefinition::new(
            "de_companies",
            LocalizedText::english("German companies"),
            LocalizedText::english("All registered German companies"),
            "53",
        )
    }

    fn rows(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let mut record = Record::new();
                record.insert("value".to_string(), serde_json::json!(i));
                record
            })
            .collect()
    }

    async fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(ClientConfig::new("k").with_base_url(server.uri())).unwrap()
    }

    #[test]
    fn test_validate_rejects_blank_label() {
        let mut def = definition();
        def.unique_label = "  ".to_string();
        assert!(matches!(
            def.validate(),
            Err(StrataError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_validate_requires_english_name() {
        let mut def = definition();
        def.name = LocalizedText::default();
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_scope_serializes_upper() {
        assert_eq!(
            serde_json::to_string(&Scope::Public).unwrap(),
            "\"PUBLIC\""
        );
        assert_eq!(
            serde_json::to_string(&Provision::Marketplace).unwrap(),
            "\"MARKETPLACE\""
        );
    }

    #[test]
    fn test_chunks_of_empty_yields_one_chunk() {
        assert_eq!(chunks_of(&[]).len(), 1);
        assert_eq!(chunks_of(&rows(3)).len(), 1);
    }

    #[test]
    fn test_receipt_with_error_envelope_fails() {
        let value = serde_json::json!({
            "detail": [{"msg": "A data stream with the given unique label already exists.", "type": "data_warning.error", "loc": ""}]
        });
        assert!(matches!(
            parse_receipt(value),
            Err(StrataError::Api(ApiError::UniqueLabelConflict))
        ));
    }

    #[tokio::test]
    async fn test_create_stream() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        Mock::given(method("POST"))
            .and(path("/data-stream/new"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"_key": "77"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = create_stream(&client, &definition(), &rows(2)).await.unwrap();
        assert_eq!(outcome.key.as_str(), "77");
        assert_eq!(outcome.kind, UpsertKind::Created);
        assert_eq!(outcome.chunks, 1);
    }

    #[tokio::test]
    async fn test_replace_requires_force() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let cache = CacheDir::new(dir.path()).unwrap();
        let stream = DataStream::new(client(&server).await, cache, "42");

        let result = stream
            .replace_data(&rows(1), &ReplaceOptions::default())
            .await;
        assert!(matches!(result, Err(StrataError::ReplaceNotConfirmed)));
    }

    #[tokio::test]
    async fn test_upsert_creates_when_label_unknown() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let cache = CacheDir::new(dir.path()).unwrap();
        let client = client(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-stream/get/label/de_companies"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "detail": [{"msg": "This data stream does not exist.", "type": "data_warning.empty", "loc": ""}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/data-stream/new"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"_key": "77"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = upsert_stream(&client, &cache, &definition(), &rows(2))
            .await
            .unwrap();
        assert_eq!(outcome.kind, UpsertKind::Created);
    }

    #[tokio::test]
    async fn test_upsert_updates_when_label_exists() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let cache = CacheDir::new(dir.path()).unwrap();
        let client = client(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-stream/get/label/de_companies"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"_key": "42"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/data-stream/add/data"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"_key": "42"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = upsert_stream(&client, &cache, &definition(), &rows(2))
            .await
            .unwrap();
        assert_eq!(outcome.kind, UpsertKind::Updated);
    }
}
