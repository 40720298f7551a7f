//! The data service handle: metadata, validation, invocation.

use tracing::{debug, info, warn};

use strata_http::{ApiClient, CacheDir, endpoints, evaluate};
use strata_types::{
    InvokeParameter, Key, Record, RequestDefinition, Result, ServiceMetadata, StrataError,
};

/// A handle on one data service of the platform.
///
/// Like the stream handle it is cheap to clone and holds no server state.
/// Invocation results can be cached on disk for a configurable number of
/// minutes; caching is off by default.
#[derive(Debug, Clone)]
pub struct DataService {
    pub(crate) client: ApiClient,
    cache: CacheDir,
    key: Key,
    cache_minutes: u64,
}

impl DataService {
    /// Creates a handle for the service with the given key.
    pub fn new(client: ApiClient, cache: CacheDir, key: impl Into<Key>) -> Self {
        Self {
            client,
            cache,
            key: key.into(),
            cache_minutes: 0,
        }
    }

    /// Enables the invocation cache with the given TTL in minutes.
    #[must_use]
    pub const fn with_cache_minutes(mut self, minutes: u64) -> Self {
        self.cache_minutes = minutes;
        self
    }

    /// Returns the service key.
    #[must_use]
    pub const fn key(&self) -> &Key {
        &self.key
    }

    /// Fetches the service metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the service does not exist or the request fails.
    pub async fn metadata(&self) -> Result<ServiceMetadata> {
        self.client.get_json(&endpoints::service_get(&self.key)).await
    }

    /// Fetches the service's input contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the service does not exist or the request fails.
    pub async fn request_definition(&self) -> Result<RequestDefinition> {
        Ok(self.metadata().await?.request_definition)
    }

    /// Invokes the service with the given parameters.
    ///
    /// Parameters are validated against the service's request definition
    /// before anything is sent. With a cache TTL configured, a result
    /// younger than the TTL is served from disk.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidParameter`] when the parameters do not
    /// match the request definition, or an error if the request fails.
    pub async fn invoke(&self, params: &[InvokeParameter]) -> Result<serde_json::Value> {
        let definition = self.request_definition().await?;
        self.invoke_with_definition(&definition, params).await
    }

    /// Invokes the service with a name-to-value map instead of a parameter
    /// list.
    ///
    /// # Errors
    ///
    /// Same as [`DataService::invoke`].
    pub async fn invoke_map(&self, params: &Record) -> Result<serde_json::Value> {
        let params: Vec<InvokeParameter> = params
            .iter()
            .map(|(name, value)| InvokeParameter::new(name.clone(), value.clone()))
            .collect();
        self.invoke(&params).await
    }

    /// Invocation against an already-fetched request definition, so bulk
    /// callers validate many invocations without re-fetching metadata.
    pub(crate) async fn invoke_with_definition(
        &self,
        definition: &RequestDefinition,
        params: &[InvokeParameter],
    ) -> Result<serde_json::Value> {
        validate(definition, params)?;

        let prefix = self.cache_prefix();
        let descriptor = cache_descriptor(&self.key, params);
        if let Some(cached) = self
            .cache
            .read_ttl::<serde_json::Value>(&prefix, &descriptor, self.cache_minutes)
        {
            debug!(key = %self.key, "invocation served from cache");
            return Ok(cached);
        }

        let body = serde_json::json!({
            "inputs": params,
            "data_service_key": self.key,
        });
        let response: serde_json::Value = self
            .client
            .post_json(endpoints::service_invoke(), &body)
            .await?;
        if response.get("detail").is_some() {
            return Err(evaluate::classify(200, &response.to_string()).into());
        }
        info!(key = %self.key, inputs = params.len(), "service invoked");

        if self.cache_minutes > 0 {
            if let Err(e) = self.cache.write_ttl(&prefix, &descriptor, &response) {
                warn!(error = %e, "invocation result not cached");
            }
        }

        Ok(response)
    }

    /// Removes this service's cached invocation results.
    ///
    /// Returns the number of removed entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be read.
    pub fn clear_cache(&self) -> Result<usize> {
        self.cache.clear_prefix(&self.cache_prefix())
    }

    fn cache_prefix(&self) -> String {
        format!("service-{}-", self.key)
    }
}

/// Cache key: the service key plus the parameters sorted by name, so the
/// same invocation always hashes the same.
fn cache_descriptor(key: &Key, params: &[InvokeParameter]) -> String {
    let mut sorted: Vec<&InvokeParameter> = params.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    let inputs: Vec<String> = sorted
        .iter()
        .map(|p| format!("{}={}", p.name, p.value))
        .collect();
    format!("{key}:{}", inputs.join("&"))
}

/// Checks invocation parameters against the request definition.
///
/// Stricter than the server: duplicates and missing required parameters
/// are rejected here as well, so a bad call never leaves the process.
fn validate(definition: &RequestDefinition, params: &[InvokeParameter]) -> Result<()> {
    if params.len() > definition.parameters.len() {
        return Err(StrataError::InvalidParameter(format!(
            "service takes at most {} parameters, got {}",
            definition.parameters.len(),
            params.len()
        )));
    }
    for (i, param) in params.iter().enumerate() {
        if definition.parameter(&param.name).is_none() {
            return Err(StrataError::InvalidParameter(format!(
                "unknown parameter `{}`",
                param.name
            )));
        }
        if params[..i].iter().any(|p| p.name == param.name) {
            return Err(StrataError::InvalidParameter(format!(
                "duplicate parameter `{}`",
                param.name
            )));
        }
    }
    for declared in &definition.parameters {
        if declared.required && !params.iter().any(|p| p.name == declared.name) {
            return Err(StrataError::InvalidParameter(format!(
                "required parameter `{}` is missing",
                declared.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_http::ClientConfig;
    use strata_types::ApiError;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn meta_body() -> serde_json::Value {
        serde_json::json!({
            "_key": "23622632",
            "name": {"en": "Address normalization"},
            "request_definition": {
                "parameters": [
                    {"name": "address_string", "required": true},
                    {"name": "country", "required": false}
                ]
            }
        })
    }

    async fn setup(server: &MockServer) -> (TempDir, DataService) {
        let dir = TempDir::new().unwrap();
        let cache = CacheDir::new(dir.path()).unwrap();
        let client = ApiClient::new(ClientConfig::new("k").with_base_url(server.uri())).unwrap();
        let service = DataService::new(client, cache, "23622632");
        (dir, service)
    }

    fn definition() -> RequestDefinition {
        serde_json::from_value(meta_body()["request_definition"].clone()).unwrap()
    }

    #[test]
    fn test_validate_rejects_unknown_parameter() {
        let params = [InvokeParameter::new("nope", "x")];
        assert!(matches!(
            validate(&definition(), &params),
            Err(StrataError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let params = [
            InvokeParameter::new("address_string", "a"),
            InvokeParameter::new("address_string", "b"),
        ];
        assert!(validate(&definition(), &params).is_err());
    }

    #[test]
    fn test_validate_requires_required() {
        let params = [InvokeParameter::new("country", "DE")];
        assert!(validate(&definition(), &params).is_err());
    }

    #[test]
    fn test_cache_descriptor_is_order_independent() {
        let key = Key::from("1");
        let a = [
            InvokeParameter::new("b", 2),
            InvokeParameter::new("a", 1),
        ];
        let b = [
            InvokeParameter::new("a", 1),
            InvokeParameter::new("b", 2),
        ];
        assert_eq!(cache_descriptor(&key, &a), cache_descriptor(&key, &b));
    }

    #[tokio::test]
    async fn test_invoke_posts_inputs() {
        let server = MockServer::start().await;
        let (_dir, service) = setup(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-service/get/23622632"))
            .respond_with(ResponseTemplate::new(200).set_body_json(meta_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/data-service/invoke"))
            .and(body_partial_json(serde_json::json!({
                "data_service_key": "23622632",
                "inputs": [{"name": "address_string", "value": "Agnes-Pockels-Bogen 1"}]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"street": "Agnes-Pockels-Bogen"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = service
            .invoke(&[InvokeParameter::new(
                "address_string",
                "Agnes-Pockels-Bogen 1",
            )])
            .await
            .unwrap();
        assert_eq!(result["street"], "Agnes-Pockels-Bogen");
    }

    #[tokio::test]
    async fn test_invoke_map_converts_entries() {
        let server = MockServer::start().await;
        let (_dir, service) = setup(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-service/get/23622632"))
            .respond_with(ResponseTemplate::new(200).set_body_json(meta_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/data-service/invoke"))
            .and(body_partial_json(serde_json::json!({
                "inputs": [{"name": "address_string", "value": "Sendlinger Str. 7"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let mut params = Record::new();
        params.insert("address_string".into(), "Sendlinger Str. 7".into());
        let result = service.invoke_map(&params).await.unwrap();
        assert_eq!(result["ok"], true);
    }

    #[tokio::test]
    async fn test_invoke_uses_ttl_cache() {
        let server = MockServer::start().await;
        let (_dir, service) = setup(&server).await;
        let service = service.with_cache_minutes(60);

        Mock::given(method("GET"))
            .and(path("/data-service/get/23622632"))
            .respond_with(ResponseTemplate::new(200).set_body_json(meta_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/data-service/invoke"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let params = [InvokeParameter::new("address_string", "x")];
        service.invoke(&params).await.unwrap();
        service.invoke(&params).await.unwrap();
    }

    #[tokio::test]
    async fn test_invoke_maps_error_envelope_in_200() {
        let server = MockServer::start().await;
        let (_dir, service) = setup(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-service/get/23622632"))
            .respond_with(ResponseTemplate::new(200).set_body_json(meta_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/data-service/invoke"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "detail": [{"msg": "Sorry, something went wrong. Please try again later.", "type": "value_error.all", "loc": ""}]
            })))
            .mount(&server)
            .await;

        let result = service
            .invoke(&[InvokeParameter::new("address_string", "x")])
            .await;
        assert!(matches!(result, Err(StrataError::Api(ApiError::Server))));
    }

    #[tokio::test]
    async fn test_clear_cache_removes_entries() {
        let server = MockServer::start().await;
        let (_dir, service) = setup(&server).await;
        let service = service.with_cache_minutes(60);

        Mock::given(method("GET"))
            .and(path("/data-service/get/23622632"))
            .respond_with(ResponseTemplate::new(200).set_body_json(meta_body()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/data-service/invoke"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})),
            )
            .mount(&server)
            .await;

        service
            .invoke(&[InvokeParameter::new("address_string", "x")])
            .await
            .unwrap();
        assert_eq!(service.clear_cache().unwrap(), 1);
        assert_eq!(service.clear_cache().unwrap(), 0);
    }
}
