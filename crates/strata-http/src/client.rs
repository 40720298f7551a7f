//! HTTP client with connection pooling, authentication and retries.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use strata_types::{Result, StrataError};

use crate::evaluate;

/// Default base URL of the Strata REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.stratadata.io/api/v1";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "STRATA_API_KEY";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Reads the API key from the environment.
///
/// # Errors
///
/// Returns a configuration error if the variable is unset or empty.
pub fn api_key_from_env() -> Result<String> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(StrataError::Config(format!("{API_KEY_ENV} is not set"))),
    }
}

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Base URL of the API, without a trailing slash.
    pub base_url: String,
    /// Maximum concurrent page downloads.
    pub concurrency: usize,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for failed requests.
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds).
    pub max_delay_ms: u64,
    /// User agent string.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration for the given API key with defaults for
    /// everything else.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: 8,
            timeout: Duration::from_secs(60),
            max_retries: 5,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            user_agent: format!("strata-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Creates a configuration with the API key taken from `STRATA_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(api_key_from_env()?))
    }

    /// Overrides the base URL (e.g. for a self-hosted deployment).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the page download concurrency.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// HTTP client for the Strata API with connection pooling and retry logic.
///
/// Cloning is cheap; all clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: Arc<ClientConfig>,
}

impl ApiClient {
    /// Creates a new API client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// underlying HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| StrataError::Config("API key contains invalid characters".to_string()))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);

        let client = Client::builder()
            // Keep one idle connection per concurrent page download
            .pool_max_idle_per_host(config.concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| StrataError::Http(e.to_string()))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds the absolute URL for an API path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// GETs an API path and deserializes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retries or the API
    /// returns an error envelope.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        let response = self
            .execute_with_retry(|| self.client.get(&url))
            .await?;
        Self::decode(response).await
    }

    /// GETs an API path with query parameters and deserializes the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retries or the API
    /// returns an error envelope.
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        let url = self.endpoint(path);
        let response = self
            .execute_with_retry(|| self.client.get(&url).query(query))
            .await?;
        Self::decode(response).await
    }

    /// GETs an API path with query parameters and returns the raw body.
    ///
    /// Used for page downloads whose body is cached on disk verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retries or the API
    /// returns an error envelope.
    pub async fn get_text_with_query(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<String> {
        let url = self.endpoint(path);
        let response = self
            .execute_with_retry(|| self.client.get(&url).query(query))
            .await?;
        response
            .text()
            .await
            .map_err(|e| StrataError::Http(e.to_string()))
    }

    /// POSTs a JSON body and deserializes the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retries or the API
    /// returns an error envelope.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let response = self
            .execute_with_retry(|| self.client.post(&url).json(body))
            .await?;
        Self::decode(response).await
    }

    /// PATCHes a JSON body and deserializes the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retries or the API
    /// returns an error envelope.
    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let response = self
            .execute_with_retry(|| self.client.patch(&url).json(body))
            .await?;
        Self::decode(response).await
    }

    /// POSTs URL-encoded form fields and deserializes the response.
    ///
    /// Repeated field names become repeated form pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retries or the API
    /// returns an error envelope.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(&'static str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path);
        let response = self
            .execute_with_retry(|| self.client.post(&url).form(fields))
            .await?;
        Self::decode(response).await
    }

    /// POSTs a multipart form of text parts and deserializes the response.
    ///
    /// The form is rebuilt for every retry attempt since multipart bodies
    /// cannot be reused.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retries or the API
    /// returns an error envelope.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        parts: &[(&'static str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path);
        let response = self
            .execute_with_retry(|| {
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in parts {
                    form = form.text(*name, value.clone());
                }
                self.client.post(&url).multipart(form)
            })
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| StrataError::Http(e.to_string()))
    }

    /// Sends a request, retrying transient failures with backoff.
    ///
    /// 5xx responses and 429 are retried; other error statuses are mapped
    /// to typed errors immediately.
    async fn execute_with_retry(
        &self,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response> {
        let mut attempts = 0;

        loop {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if (status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS)
                        && attempts < self.config.max_retries
                    {
                        attempts += 1;
                        let delay = self.backoff_delay(attempts);
                        warn!(
                            status = status.as_u16(),
                            attempt = attempts,
                            delay_ms = delay.as_millis() as u64,
                            "retrying after server error"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return evaluate::check(response).await;
                }
                Err(e) if Self::is_retryable_error(&e) && attempts < self.config.max_retries => {
                    attempts += 1;
                    let delay = self.backoff_delay(attempts);
                    debug!(error = %e, attempt = attempts, "retrying after transport error");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(StrataError::Http(e.to_string())),
            }
        }
    }

    /// Calculates the backoff delay with exponential growth and jitter.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp_delay = self
            .config
            .base_delay_ms
            .saturating_mul(1u64 << attempt.min(10));
        let capped = exp_delay.min(self.config.max_delay_ms);

        // Deterministic jitter (±25%) keyed on the attempt number; avoids
        // pulling in a random number generator.
        let jitter_range = capped / 4;
        let jitter = if jitter_range > 0 {
            (u64::from(attempt) * 17 % (jitter_range * 2)).saturating_sub(jitter_range)
        } else {
            0
        };

        Duration::from_millis((capped + jitter).max(100))
    }

    /// Determines if a transport error is worth retrying.
    fn is_retryable_error(error: &reqwest::Error) -> bool {
        if error.is_builder() {
            return false;
        }
        error.is_timeout() || error.is_connect() || error.is_request()
    }
}
