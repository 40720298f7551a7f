//! The `Strata` hub: one configured entry point handing out resource
//! handles.

use strata_http::{ApiClient, CacheDir, ClientConfig, endpoints};
use strata_service::DataService;
use strata_stream::DataStream;
use strata_types::{CollectionInfo, Key, Result, SourceInfo, StrataError};

/// Entry point to the Strata platform.
///
/// Holds the configured API client and cache directory and hands out
/// [`DataStream`] and [`DataService`] handles sharing them.
#[derive(Debug, Clone)]
pub struct Strata {
    client: ApiClient,
    cache: CacheDir,
}

impl Strata {
    /// Creates a hub from an explicit configuration, caching under the
    /// platform default cache directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the cache
    /// directory cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(config)?,
            cache: CacheDir::with_default_path()?,
        })
    }

    /// Creates a hub with the API key taken from `STRATA_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unset or the cache directory
    /// cannot be created.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Creates a hub with an explicit cache directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the directory
    /// cannot be created.
    pub fn with_cache_dir(config: ClientConfig, dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(config)?,
            cache: CacheDir::new(dir)?,
        })
    }

    /// Returns the underlying API client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Returns the cache directory.
    #[must_use]
    pub const fn cache(&self) -> &CacheDir {
        &self.cache
    }

    /// Returns a handle on the stream with the given key.
    #[must_use]
    pub fn data_stream(&self, key: impl Into<Key>) -> DataStream {
        DataStream::new(self.client.clone(), self.cache.clone(), key)
    }

    /// Returns a handle on the stream carrying the given unique label.
    ///
    /// # Errors
    ///
    /// Returns an error if the label does not exist.
    pub async fn data_stream_by_label(&self, label: &str) -> Result<DataStream> {
        DataStream::open_by_label(self.client.clone(), self.cache.clone(), label).await
    }

    /// Returns a handle on the service with the given key.
    #[must_use]
    pub fn data_service(&self, key: impl Into<Key>) -> DataService {
        DataService::new(self.client.clone(), self.cache.clone(), key)
    }

    /// Lists all data sources visible to the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_sources(&self) -> Result<Vec<SourceInfo>> {
        self.client.get_json(endpoints::sources_all()).await
    }

    /// Lists all stream collections visible to the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        self.client.get_json(endpoints::collections_all()).await
    }

    /// Creates a stream collection and returns the server's receipt.
    ///
    /// The name must be longer than three characters and must not collide
    /// with an existing collection name (compared case-insensitively).
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, already taken, or the
    /// request fails.
    pub async fn create_collection(
        &self,
        name: &str,
        description: &str,
    ) -> Result<serde_json::Value> {
        let name = name.trim();
        if name.chars().count() <= 3 {
            return Err(StrataError::InvalidParameter(
                "collection name must be longer than 3 characters".to_string(),
            ));
        }
        let existing = self.list_collections().await?;
        if existing
            .iter()
            .any(|collection| collection.name.eq_ignore_ascii_case(name))
        {
            return Err(StrataError::InvalidParameter(format!(
                "a collection named `{name}` already exists"
            )));
        }
        let fields = [
            ("collection_name", name.to_string()),
            ("description", description.trim().to_string()),
        ];
        self.client
            .post_form(endpoints::collection_create(), &fields)
            .await
    }

    /// Adds streams to a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if no stream keys are given or the request fails.
    pub async fn add_streams_to_collection(
        &self,
        collection: &Key,
        streams: &[Key],
    ) -> Result<serde_json::Value> {
        if streams.is_empty() {
            return Err(StrataError::InvalidParameter(
                "no data stream keys provided".to_string(),
            ));
        }
        let mut fields = vec![("collection_key", collection.as_str().to_string())];
        for key in streams {
            fields.push(("data_stream_keys", key.as_str().to_string()));
        }
        self.client
            .post_form(endpoints::collection_add_streams(), &fields)
            .await
    }
}
