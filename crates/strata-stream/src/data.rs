//! Concurrent, cached page download.

use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use strata_http::endpoints;
use strata_types::{
    DataPage, MAX_PAGE_ROWS, PageRange, Record, Result, StrataError, plan_pages,
};

use crate::DataStream;

/// Columns the platform adds to every stream. They are appended to any
/// explicit field projection so results stay identifiable and versioned.
pub const SYSTEM_FIELDS: [&str; 3] = ["st_id", "st_data_version", "st_datetime"];

/// Streams whose per-batch share stays below this row count are fetched
/// with one page per core.
const ROWS_PER_BATCH_LIMIT: u64 = 500_000;

/// Divisor that widens the batch count for very large streams.
const BATCH_WIDEN_DIVISOR: u64 = 8_000_000;

/// Query options for [`DataStream::get_data`].
#[derive(Debug, Clone, Default)]
pub struct DataQuery {
    /// Column projection. Empty means all columns.
    pub fields: Vec<String>,
    /// Explicit rows to skip. Only effective together with `limit`.
    pub skip: Option<u64>,
    /// Explicit row limit. Only effective together with `skip`.
    pub limit: Option<u64>,
    /// Bypass the local page cache and always download.
    pub live: bool,
}

impl DataQuery {
    /// Creates an empty query (whole stream, all columns, cached).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the result to the given columns (system columns are always
    /// included).
    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Requests one explicit row window instead of the whole stream.
    #[must_use]
    pub const fn with_range(mut self, skip: u64, limit: u64) -> Self {
        self.skip = Some(skip);
        self.limit = Some(limit);
        self
    }

    /// Bypasses the local page cache.
    #[must_use]
    pub const fn live(mut self) -> Self {
        self.live = true;
        self
    }
}

/// The rows of a single fetched page.
#[derive(Debug, Clone)]
pub struct PageBatch {
    /// The row range this page covers.
    pub range: PageRange,
    /// The rows of the page.
    pub records: Vec<Record>,
    /// Whether this page failed and was skipped (resilient mode only).
    pub had_error: bool,
}

impl PageBatch {
    /// Creates a page batch.
    #[must_use]
    pub const fn new(range: PageRange, records: Vec<Record>) -> Self {
        Self {
            range,
            records,
            had_error: false,
        }
    }

    /// Creates an empty batch marking a skipped page.
    #[must_use]
    pub const fn skipped_error(range: PageRange) -> Self {
        Self {
            range,
            records: Vec::new(),
            had_error: true,
        }
    }

    /// Returns the number of rows in the batch.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the batch holds no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Appends the system columns to a non-empty projection, deduplicated and
/// order preserving. An empty projection stays empty (all columns).
#[must_use]
pub fn effective_fields(fields: &[String]) -> Vec<String> {
    if fields.is_empty() {
        return Vec::new();
    }
    let mut result: Vec<String> = Vec::with_capacity(fields.len() + SYSTEM_FIELDS.len());
    for field in fields
        .iter()
        .map(String::as_str)
        .chain(SYSTEM_FIELDS)
    {
        if !result.iter().any(|f| f == field) {
            result.push(field.to_string());
        }
    }
    result
}

/// Number of parallel page downloads to plan for on this machine.
fn default_batches() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get().saturating_sub(1).max(1))
}

impl DataStream {
    /// Downloads the queried rows, fetching pages concurrently.
    ///
    /// Without an explicit `skip`/`limit` window the whole stream is paged
    /// according to its entry count. Pages already present in the local
    /// cache are not downloaded again unless [`DataQuery::live`] is set.
    /// Rows are returned in stream order.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream does not exist, its metadata carries
    /// no entry count, or any page fails after all retries.
    pub async fn get_data(&self, query: &DataQuery) -> Result<Vec<Record>> {
        let mut batches = {
            let mut pages = self.page_stream(query).await?;
            let mut batches = Vec::new();
            while let Some(batch) = pages.next().await {
                batches.push(batch?);
            }
            batches
        };

        // buffer_unordered yields pages as they finish; restore row order
        batches.sort_by_key(|b| b.range.skip);

        let total = batches.iter().map(PageBatch::len).sum();
        let mut records: Vec<Record> = Vec::with_capacity(total);
        for batch in batches {
            records.extend(batch.records);
        }
        info!(key = %self.key(), rows = records.len(), "stream data assembled");
        Ok(records)
    }

    /// Streams page batches as they finish downloading.
    ///
    /// # Errors
    ///
    /// Returns an error if the page plan cannot be derived. Individual page
    /// failures surface as `Err` items.
    pub async fn page_stream(
        &self,
        query: &DataQuery,
    ) -> Result<impl Stream<Item = Result<PageBatch>> + '_> {
        let plan = self.page_plan(query).await?;
        let fields = Arc::new(effective_fields(&query.fields));
        let live = query.live;
        let concurrency = self.client.config().concurrency;

        Ok(stream::iter(plan)
            .map(move |range| {
                let fields = Arc::clone(&fields);
                async move { self.fetch_page(range, &fields, live).await }
            })
            .buffer_unordered(concurrency))
    }

    /// Streams page batches, skipping failed pages instead of failing.
    ///
    /// Useful for long downloads where an occasional lost page is
    /// acceptable; skipped pages come back empty with
    /// [`PageBatch::had_error`] set.
    ///
    /// # Errors
    ///
    /// Returns an error if the page plan cannot be derived.
    pub async fn page_stream_resilient(
        &self,
        query: &DataQuery,
    ) -> Result<impl Stream<Item = PageBatch> + '_> {
        let plan = self.page_plan(query).await?;
        let fields = Arc::new(effective_fields(&query.fields));
        let live = query.live;
        let concurrency = self.client.config().concurrency;

        Ok(stream::iter(plan)
            .map(move |range| {
                let fields = Arc::clone(&fields);
                async move {
                    match self.fetch_page(range, &fields, live).await {
                        Ok(batch) => batch,
                        Err(e) => {
                            warn!(%range, error = %e, "page skipped after retries");
                            PageBatch::skipped_error(range)
                        }
                    }
                }
            })
            .buffer_unordered(concurrency))
    }

    /// Derives the page plan for a query.
    async fn page_plan(&self, query: &DataQuery) -> Result<Vec<PageRange>> {
        if let (Some(skip), Some(limit)) = (query.skip, query.limit) {
            let rows = if limit > MAX_PAGE_ROWS {
                warn!(
                    limit,
                    max = MAX_PAGE_ROWS,
                    "limit exceeds the per-request maximum and was clamped"
                );
                MAX_PAGE_ROWS
            } else {
                limit
            };
            return Ok(vec![PageRange::new(skip, rows)]);
        }

        let meta = self.metadata().await?;
        let total = meta
            .entry_count()
            .ok_or_else(|| StrataError::MissingEntryCount(self.key().to_string()))?;

        let mut batches = default_batches();
        if total / batches as u64 >= ROWS_PER_BATCH_LIMIT {
            // Very large stream: widen the batch count so single pages stay
            // a manageable size.
            batches = total
                .saturating_mul(batches as u64)
                .div_ceil(BATCH_WIDEN_DIVISOR)
                .max(1) as usize;
        }

        let plan = plan_pages(total, batches);
        info!(key = %self.key(), total, pages = plan.len(), "planned page download");
        Ok(plan)
    }

    /// Fetches one page, consulting the local cache first.
    async fn fetch_page(
        &self,
        range: PageRange,
        fields: &[String],
        live: bool,
    ) -> Result<PageBatch> {
        let descriptor = format!(
            "{}:{}:{}:{}",
            self.key(),
            range.skip,
            range.rows,
            fields.join(",")
        );
        let prefix = format!("stream-{}-", self.key());
        let path = self.cache.entry_path(&prefix, &descriptor);

        if !live {
            if let Some(body) = self.cache.read_text(&path) {
                match serde_json::from_str::<DataPage>(&body) {
                    Ok(page) => {
                        debug!(%range, "page served from cache");
                        return Ok(PageBatch::new(range, page.data));
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "discarding corrupt page cache entry");
                    }
                }
            }
        }

        let query = endpoints::stream_data_query(range, fields);
        let body = self
            .client
            .get_text_with_query(&endpoints::stream_data(self.key()), &query)
            .await?;
        let page: DataPage = serde_json::from_str(&body)?;

        if let Err(e) = self.cache.write_text(&path, &body) {
            warn!(error = %e, "page downloaded but not cached");
        }

        Ok(PageBatch::new(range, page.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_http::{ApiClient, CacheDir, ClientConfig};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(server: &MockServer) -> (TempDir, DataStream) {
        let dir = TempDir::new().unwrap();
        let cache = CacheDir::new(dir.path()).unwrap();
        let client = ApiClient::new(ClientConfig::new("k").with_base_url(server.uri())).unwrap();
        let stream = DataStream::new(client, cache, "42");
        (dir, stream)
    }

    fn page_body(rows: &[(&str, u64)]) -> serde_json::Value {
        let data: Vec<serde_json::Value> = rows
            .iter()
            .map(|(id, v)| serde_json::json!({"st_id": id, "value": v}))
            .collect();
        serde_json::json!({ "data": data })
    }

    #[test]
    fn test_effective_fields_appends_system_columns() {
        let fields = effective_fields(&["company_name".to_string(), "st_id".to_string()]);
        assert_eq!(
            fields,
            vec!["company_name", "st_id", "st_data_version", "st_datetime"]
        );
    }

    #[test]
    fn test_effective_fields_empty_stays_empty() {
        assert!(effective_fields(&[]).is_empty());
    }

    #[test]
    fn test_query_builder() {
        let query = DataQuery::new().with_fields(["a"]).with_range(10, 20).live();
        assert_eq!(query.fields, vec!["a"]);
        assert_eq!(query.skip, Some(10));
        assert_eq!(query.limit, Some(20));
        assert!(query.live);
    }

    #[tokio::test]
    async fn test_explicit_window_single_page() {
        let server = MockServer::start().await;
        let (_dir, stream) = setup(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-stream/get/42"))
            .and(query_param("skip", "10"))
            .and(query_param("limit", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_body(&[("a", 1), ("b", 2)])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let records = stream
            .get_data(&DataQuery::new().with_range(10, 2))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["st_id"], "a");
    }

    #[tokio::test]
    async fn test_limit_clamped_to_maximum() {
        let server = MockServer::start().await;
        let (_dir, stream) = setup(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-stream/get/42"))
            .and(query_param("limit", MAX_PAGE_ROWS.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[])))
            .expect(1)
            .mount(&server)
            .await;

        stream
            .get_data(&DataQuery::new().with_range(0, MAX_PAGE_ROWS + 1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_full_stream_uses_entry_count() {
        let server = MockServer::start().await;
        let (_dir, stream) = setup(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-stream/get/42/meta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_key": "42",
                "meta": {"entry_count": 1}
            })))
            .mount(&server)
            .await;

        // one row collapses to a single page regardless of core count
        Mock::given(method("GET"))
            .and(path("/data-stream/get/42"))
            .and(query_param("skip", "0"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[("a", 1)])))
            .expect(1)
            .mount(&server)
            .await;

        let records = stream.get_data(&DataQuery::new()).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_skips_second_download() {
        let server = MockServer::start().await;
        let (_dir, stream) = setup(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-stream/get/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[("a", 1)])))
            .expect(1)
            .mount(&server)
            .await;

        let query = DataQuery::new().with_range(0, 10);
        let first = stream.get_data(&query).await.unwrap();
        let second = stream.get_data(&query).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn test_live_bypasses_cache() {
        let server = MockServer::start().await;
        let (_dir, stream) = setup(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-stream/get/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[("a", 1)])))
            .expect(2)
            .mount(&server)
            .await;

        let query = DataQuery::new().with_range(0, 10).live();
        stream.get_data(&query).await.unwrap();
        stream.get_data(&query).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_entry_count_is_an_error() {
        let server = MockServer::start().await;
        let (_dir, stream) = setup(&server).await;

        Mock::given(method("GET"))
            .and(path("/data-stream/get/42/meta"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"_key": "42"})),
            )
            .mount(&server)
            .await;

        let result = stream.get_data(&DataQuery::new()).await;
        assert!(matches!(result, Err(StrataError::MissingEntryCount(_))));
    }

    #[tokio::test]
    async fn test_resilient_stream_flags_failed_pages() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let cache = CacheDir::new(dir.path()).unwrap();
        let mut config = ClientConfig::new("k").with_base_url(server.uri());
        config.max_retries = 0;
        let client = ApiClient::new(config).unwrap();
        let stream = DataStream::new(client, cache, "42");

        Mock::given(method("GET"))
            .and(path("/data-stream/get/42"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let query = DataQuery::new().with_range(0, 10);
        let mut pages = stream.page_stream_resilient(&query).await.unwrap();
        let batch = pages.next().await.unwrap();
        assert!(batch.had_error);
        assert!(batch.is_empty());
    }
}
