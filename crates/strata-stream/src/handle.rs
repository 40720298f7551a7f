//! The data stream handle and metadata operations.

use serde_json::json;
use tracing::info;

use strata_http::{ApiClient, CacheDir, endpoints};
use strata_types::{FieldDefinition, Key, LabelRef, Result, StreamMetadata};

/// Looks up a stream key by its unique label.
///
/// # Errors
///
/// Returns [`strata_types::ApiError::StreamNotFound`] if no stream carries
/// the label.
pub async fn resolve_label(client: &ApiClient, label: &str) -> Result<Key> {
    let reference: LabelRef = client.get_json(&endpoints::stream_by_label(label)).await?;
    Ok(reference.key)
}

/// A handle on one data stream of the platform.
///
/// The handle is cheap to clone and holds no server state; every operation
/// is a fresh request (modulo the local page cache).
#[derive(Debug, Clone)]
pub struct DataStream {
    pub(crate) client: ApiClient,
    pub(crate) cache: CacheDir,
    key: Key,
}

impl DataStream {
    /// Creates a handle for the stream with the given key.
    pub fn new(client: ApiClient, cache: CacheDir, key: impl Into<Key>) -> Self {
        Self {
            client,
            cache,
            key: key.into(),
        }
    }

    /// Creates a handle by resolving a unique label to its key.
    ///
    /// # Errors
    ///
    /// Returns an error if the label does not exist.
    pub async fn open_by_label(client: ApiClient, cache: CacheDir, label: &str) -> Result<Self> {
        let key = resolve_label(&client, label).await?;
        info!(%key, label, "resolved stream label");
        Ok(Self::new(client, cache, key))
    }

    /// Returns the stream key.
    #[must_use]
    pub const fn key(&self) -> &Key {
        &self.key
    }

    /// Fetches the stream metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream does not exist or the request fails.
    pub async fn metadata(&self) -> Result<StreamMetadata> {
        self.client.get_json(&endpoints::stream_meta(&self.key)).await
    }

    /// Fetches the stream schema (its field definitions).
    ///
    /// # Errors
    ///
    /// Returns an error if the stream does not exist or the request fails.
    pub async fn schema(&self) -> Result<Vec<FieldDefinition>> {
        Ok(self.metadata().await?.data_item_collections)
    }

    /// Patches the stream's metadata attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream does not exist or the caller may not
    /// edit it.
    pub async fn update_metadata(&self, attributes: serde_json::Value) -> Result<()> {
        let body = json!({
            "data_stream_key": self.key,
            "attributes": attributes,
        });
        let _: serde_json::Value = self
            .client
            .patch_json(endpoints::stream_meta_update(), &body)
            .await?;
        Ok(())
    }

    /// Assigns the data source feeding this stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream or source does not exist or the
    /// caller may not edit the stream.
    pub async fn set_source(&self, source_key: &Key, stream_specific_uri: &str) -> Result<()> {
        let body = json!({
            "data_stream_key": self.key,
            "source_key": source_key,
            "stream_specific_uri": stream_specific_uri,
        });
        let _: serde_json::Value = self
            .client
            .patch_json(endpoints::stream_set_source(), &body)
            .await?;
        info!(key = %self.key, source = %source_key, "stream source updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_http::ClientConfig;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(server: &MockServer) -> (TempDir, ApiClient, CacheDir) {
        let dir = TempDir::new().unwrap();
        let cache = CacheDir::new(dir.path()).unwrap();
        let client = ApiClient::new(ClientConfig::new("k").with_base_url(server.uri())).unwrap();
        (dir, client, cache)
    }

    #[tokio::test]
    async fn test_metadata_fetch() {
        let server = MockServer::start().await;
        let (_dir, client, cache) = setup(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-stream/get/42/meta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_key": "42",
                "unique_label": "de_streets",
                "name": {"en": "German streets"},
                "meta": {"entry_count": 120, "main_property_count": 4}
            })))
            .mount(&server)
            .await;

        let stream = DataStream::new(client, cache, "42");
        let meta = stream.metadata().await.unwrap();
        assert_eq!(meta.unique_label.as_deref(), Some("de_streets"));
        assert_eq!(meta.entry_count(), Some(120));
    }

    #[tokio::test]
    async fn test_open_by_label() {
        let server = MockServer::start().await;
        let (_dir, client, cache) = setup(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-stream/get/label/de_streets"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"_key": "42"})),
            )
            .mount(&server)
            .await;

        let stream = DataStream::open_by_label(client, cache, "de_streets")
            .await
            .unwrap();
        assert_eq!(stream.key().as_str(), "42");
    }

    #[tokio::test]
    async fn test_update_metadata_body() {
        let server = MockServer::start().await;
        let (_dir, client, cache) = setup(&server).await;

        Mock::given(method("PATCH"))
            .and(path("/data-stream/meta/update"))
            .and(body_partial_json(serde_json::json!({
                "data_stream_key": "42",
                "attributes": {"description": {"en": "Street register"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let stream = DataStream::new(client, cache, "42");
        stream
            .update_metadata(serde_json::json!({"description": {"en": "Street register"}}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_source_body() {
        let server = MockServer::start().await;
        let (_dir, client, cache) = setup(&server).await;

        Mock::given(method("PATCH"))
            .and(path("/data-stream/meta/set-source"))
            .and(body_partial_json(serde_json::json!({
                "data_stream_key": "42",
                "source_key": "911",
                "stream_specific_uri": "https://example.org/feed"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let stream = DataStream::new(client, cache, "42");
        stream
            .set_source(&Key::from("911"), "https://example.org/feed")
            .await
            .unwrap();
    }
}
