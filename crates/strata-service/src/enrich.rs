//! Bulk enrichment: one service invocation per record.

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::info;

use strata_types::{InvokeParameter, Record, Result, StrataError};

use crate::DataService;

/// Maps a record field to a service input parameter.
#[derive(Debug, Clone)]
pub struct InputMapping {
    /// The field to read from each record.
    pub record_field: String,
    /// The service parameter to feed it into.
    pub parameter: String,
}

impl InputMapping {
    /// Creates a mapping from a record field to a service parameter.
    pub fn new(record_field: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            record_field: record_field.into(),
            parameter: parameter.into(),
        }
    }

    /// Creates a mapping where field and parameter share a name.
    pub fn same(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            record_field: name.clone(),
            parameter: name,
        }
    }
}

fn build_params(record: &Record, mappings: &[InputMapping]) -> Result<Vec<InvokeParameter>> {
    mappings
        .iter()
        .map(|mapping| {
            let value = record.get(&mapping.record_field).cloned().ok_or_else(|| {
                StrataError::InvalidParameter(format!(
                    "record has no field `{}`",
                    mapping.record_field
                ))
            })?;
            Ok(InvokeParameter::new(mapping.parameter.clone(), value))
        })
        .collect()
}

impl DataService {
    /// Invokes the service once per record and merges each result into its
    /// record under `target_field`.
    ///
    /// Invocations run concurrently up to the client's concurrency limit;
    /// record order is preserved.
    ///
    /// # Errors
    ///
    /// Returns an error if a record lacks a mapped field, the mapped
    /// parameters fail validation, or any invocation fails.
    pub async fn enrich(
        &self,
        records: &[Record],
        mappings: &[InputMapping],
        target_field: &str,
    ) -> Result<Vec<Record>> {
        let definition = self.request_definition().await?;
        let concurrency = self.client.config().concurrency;

        let enriched: Vec<Record> = stream::iter(records.iter().cloned())
            .map(|mut record| {
                let definition = &definition;
                async move {
                    let params = build_params(&record, mappings)?;
                    let result = self.invoke_with_definition(definition, &params).await?;
                    record.insert(target_field.to_string(), result);
                    Ok::<Record, StrataError>(record)
                }
            })
            .buffered(concurrency)
            .try_collect()
            .await?;

        info!(key = %self.key(), records = enriched.len(), "records enriched");
        Ok(enriched)
    }
}
