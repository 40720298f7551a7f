//! Delta downloads: rows added after a known data version.

use tracing::{debug, warn};

use strata_http::endpoints;
use strata_types::{DataPage, DataVersion, Record, Result};

use crate::DataStream;

impl DataStream {
    /// Downloads the rows added after the given data version.
    ///
    /// The result is cached like a regular page; pass `live` to force a
    /// download. An empty result means the stream has not changed since
    /// that version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version is unknown to the platform or the
    /// request fails after all retries.
    pub async fn delta_data(&self, version: &DataVersion, live: bool) -> Result<Vec<Record>> {
        let descriptor = format!("{}:delta:{version}", self.key());
        let prefix = format!("stream-{}-", self.key());
        let path = self.cache.entry_path(&prefix, &descriptor);

        if !live {
            if let Some(body) = self.cache.read_text(&path) {
                match serde_json::from_str::<DataPage>(&body) {
                    Ok(page) => {
                        debug!(%version, "delta served from cache");
                        return Ok(page.data);
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "discarding corrupt delta cache entry");
                    }
                }
            }
        }

        let body = self
            .client
            .get_text_with_query(&endpoints::stream_delta(self.key(), version), &[])
            .await?;
        let page: DataPage = serde_json::from_str(&body)?;

        if page.is_empty() {
            warn!(key = %self.key(), %version, "no rows newer than the given version");
        }

        if let Err(e) = self.cache.write_text(&path, &body) {
            warn!(error = %e, "delta downloaded but not cached");
        }

        Ok(page.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strata_http::{ApiClient, CacheDir, ClientConfig};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn version() -> DataVersion {
        DataVersion::from_str("8c5f0e6e-9d7b-4a6e-93a4-7a1f3d2b0c9e").unwrap()
    }

    #[tokio::test]
    async fn test_delta_download_and_cache() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let cache = CacheDir::new(dir.path()).unwrap();
        let client = ApiClient::new(ClientConfig::new("k").with_base_url(server.uri())).unwrap();
        let stream = DataStream::new(client, cache, "42");
        let version = version();

        Mock::given(method("GET"))
            .and(path(format!("/data-stream/get/delta/42/{version}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"st_id": "a", "value": 1}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let first = stream.delta_data(&version, false).await.unwrap();
        let second = stream.delta_data(&version, false).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn test_delta_empty_is_ok() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let cache = CacheDir::new(dir.path()).unwrap();
        let client = ApiClient::new(ClientConfig::new("k").with_base_url(server.uri())).unwrap();
        let stream = DataStream::new(client, cache, "42");
        let version = version();

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})),
            )
            .mount(&server)
            .await;

        let records = stream.delta_data(&version, true).await.unwrap();
        assert!(records.is_empty());
    }
}
