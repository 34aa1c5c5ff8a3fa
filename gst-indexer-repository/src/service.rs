//! Search index service implementation.
//!
//! This module provides the main service for writing into the search index.
//! Application code uses it to create indices, bulk load documents and move
//! aliases.

use std::time::Duration;

use serde_json::Value;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tracing::{debug, info, warn};

use crate::config::SearchIndexServiceConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::alias_swap_actions;
use crate::types::{BatchOperationResult, BatchOperationSummary, IndexDocumentRequest};

/// The main service for interacting with the search index.
///
/// This is the high-level API that application code should use. It validates
/// input, splits bulk loads into chunks, retries transient failures and
/// delegates to a `SearchIndexProvider` for the actual backend operations.
///
/// # Example
///
/// ```no_run
/// use gst_indexer_repository::{IndexDocumentRequest, OpenSearchProvider, SearchIndexService};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = Box::new(OpenSearchProvider::new("http://localhost:9200", None)?);
/// let service = SearchIndexService::new(provider);
///
/// let summary = service
///     .bulk_index(
///         "global-stocktake-20230908-140509",
///         vec![IndexDocumentRequest::new("DOC_p1_b1", json!({ "text": "Coal" }))],
///     )
///     .await?;
/// println!("{} documents indexed", summary.succeeded);
/// # Ok(())
/// # }
/// ```
pub struct SearchIndexService {
    provider: Box<dyn SearchIndexProvider>,
    config: SearchIndexServiceConfig,
}

impl SearchIndexService {
    /// Create a new SearchIndexService with default configuration.
    ///
    /// The default configuration sends 500 documents per bulk request and
    /// retries transient failures up to 5 times.
    pub fn new(provider: Box<dyn SearchIndexProvider>) -> Self {
        Self {
            provider,
            config: SearchIndexServiceConfig::default(),
        }
    }

    /// Create a new SearchIndexService with custom configuration.
    pub fn with_config(
        provider: Box<dyn SearchIndexProvider>,
        config: SearchIndexServiceConfig,
    ) -> Self {
        Self { provider, config }
    }

    fn validate_index_name(name: &str) -> Result<(), SearchIndexError> {
        if name.trim().is_empty() {
            return Err(SearchIndexError::validation("index name is required"));
        }
        Ok(())
    }

    /// Delays between retry rounds: `initial_backoff`, doubling, capped at `max_backoff`.
    fn backoff(&self) -> impl Iterator<Item = Duration> {
        let factor = (self.config.initial_backoff.as_millis() as u64 / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.config.max_backoff)
            .map(jitter)
            .take(self.config.max_retries)
    }

    /// Check that the backend is reachable.
    pub async fn ping(&self) -> Result<(), SearchIndexError> {
        self.provider.ping().await
    }

    /// Create an index with the given settings and mappings.
    pub async fn create_index(&self, index: &str, settings: &Value) -> Result<(), SearchIndexError> {
        Self::validate_index_name(index)?;
        self.provider.create_index(index, settings).await
    }

    /// Write a single document.
    pub async fn index_document(
        &self,
        index: &str,
        request: IndexDocumentRequest,
    ) -> Result<(), SearchIndexError> {
        Self::validate_index_name(index)?;
        self.provider.index_document(index, &request).await
    }

    /// Load documents into `index` in chunks of `chunk_size`.
    ///
    /// Failed documents whose failure is transient (HTTP 429 or 5xx) are sent
    /// again, alone, up to `max_retries` times with exponential backoff. Other
    /// per-document failures are reported in the summary and do not stop the
    /// load.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - One result per input document, in input order
    /// * `Err(SearchIndexError)` - If a request failed as a whole for a
    ///   non-transient reason, such as a lost connection
    pub async fn bulk_index(
        &self,
        index: &str,
        requests: Vec<IndexDocumentRequest>,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        Self::validate_index_name(index)?;

        if requests.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        let mut results = Vec::with_capacity(requests.len());
        for (chunk_number, chunk) in requests.chunks(self.config.chunk_size).enumerate() {
            let chunk_results = self.load_chunk(index, chunk).await?;
            let failed = chunk_results.iter().filter(|r| !r.success).count();
            debug!(
                index = %index,
                chunk = chunk_number,
                size = chunk.len(),
                failed = failed,
                "Chunk loaded"
            );
            results.extend(chunk_results);
        }

        let summary = BatchOperationSummary::from_results(results);
        info!(
            index = %index,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk load completed"
        );
        Ok(summary)
    }

    /// Send one chunk, retrying its transient failures.
    async fn load_chunk(
        &self,
        index: &str,
        chunk: &[IndexDocumentRequest],
    ) -> Result<Vec<BatchOperationResult>, SearchIndexError> {
        let mut slots: Vec<Option<BatchOperationResult>> = vec![None; chunk.len()];
        let mut pending: Vec<usize> = (0..chunk.len()).collect();
        let mut delays = self.backoff();

        loop {
            let batch: Vec<IndexDocumentRequest> =
                pending.iter().map(|&i| chunk[i].clone()).collect();

            let round: Vec<BatchOperationResult> =
                match self.provider.bulk_index_documents(index, &batch).await {
                    Ok(summary) => summary.results,
                    Err(e) if e.is_retryable() => batch
                        .iter()
                        .map(|r| BatchOperationResult::failed(&r.id, e.clone(), true))
                        .collect(),
                    Err(e) => return Err(e),
                };

            let mut retry = Vec::new();
            for (&slot, result) in pending.iter().zip(round) {
                if !result.success && result.retryable {
                    retry.push(slot);
                }
                slots[slot] = Some(result);
            }

            if retry.is_empty() {
                break;
            }

            match delays.next() {
                Some(delay) => {
                    warn!(
                        index = %index,
                        retrying = retry.len(),
                        delay_ms = delay.as_millis() as u64,
                        "Retrying transiently failed documents"
                    );
                    tokio::time::sleep(delay).await;
                    pending = retry;
                }
                None => {
                    warn!(
                        index = %index,
                        failed = retry.len(),
                        "Retry budget exhausted"
                    );
                    break;
                }
            }
        }

        Ok(slots
            .into_iter()
            .zip(chunk)
            .map(|(slot, request)| {
                slot.unwrap_or_else(|| {
                    BatchOperationResult::failed(
                        &request.id,
                        SearchIndexError::unknown("no result reported"),
                        false,
                    )
                })
            })
            .collect())
    }

    /// Point each `(alias, new_index)` pair's alias at its new index only,
    /// in one atomic update.
    ///
    /// Indices that currently carry an alias lose it. Either every alias
    /// moves or none does. Returns the indices aliases were removed from.
    pub async fn swap_aliases(
        &self,
        swaps: &[(&str, &str)],
    ) -> Result<Vec<String>, SearchIndexError> {
        let mut actions = Vec::new();
        let mut removed = Vec::new();

        for &(alias, new_index) in swaps {
            Self::validate_index_name(new_index)?;
            if alias.trim().is_empty() {
                return Err(SearchIndexError::validation("alias is required"));
            }

            let current = self.provider.indices_for_alias(alias).await?;
            actions.extend(alias_swap_actions(alias, &current, new_index));
            removed.extend(current.into_iter().filter(|i| i != new_index));
        }

        if actions.is_empty() {
            return Ok(removed);
        }
        self.provider.update_aliases(&actions).await?;

        for &(alias, new_index) in swaps {
            info!(alias = %alias, index = %new_index, "Alias moved");
        }
        info!(removed_from = ?removed, "Aliases swapped");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AliasAction;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Mock provider for testing.
    ///
    /// Documents whose id is in `rejected` always fail permanently. Documents
    /// in `throttled` fail transiently for the given number of attempts.
    #[derive(Default)]
    struct MockProvider {
        bulk_calls: Arc<AtomicUsize>,
        batch_sizes: Arc<Mutex<Vec<usize>>>,
        rejected: Vec<String>,
        throttled: Arc<Mutex<HashMap<String, usize>>>,
        whole_request_error: Option<SearchIndexError>,
        aliased: Vec<String>,
        alias_actions: Arc<Mutex<Vec<AliasAction>>>,
        alias_update_calls: Arc<AtomicUsize>,
        alias_update_error: Option<SearchIndexError>,
    }

    #[async_trait]
    impl SearchIndexProvider for MockProvider {
        async fn ping(&self) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn create_index(
            &self,
            _index: &str,
            _settings: &Value,
        ) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn index_document(
            &self,
            _index: &str,
            _request: &IndexDocumentRequest,
        ) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn bulk_index_documents(
            &self,
            _index: &str,
            requests: &[IndexDocumentRequest],
        ) -> Result<BatchOperationSummary, SearchIndexError> {
            self.bulk_calls.fetch_add(1, Ordering::SeqCst);
            self.batch_sizes.lock().await.push(requests.len());

            if let Some(error) = &self.whole_request_error {
                return Err(error.clone());
            }

            let mut throttled = self.throttled.lock().await;
            let results = requests
                .iter()
                .map(|r| {
                    if self.rejected.contains(&r.id) {
                        return BatchOperationResult::failed(
                            &r.id,
                            SearchIndexError::index("mapper_parsing_exception"),
                            false,
                        );
                    }
                    if let Some(remaining) = throttled.get_mut(&r.id) {
                        if *remaining > 0 {
                            *remaining -= 1;
                            return BatchOperationResult::failed(
                                &r.id,
                                SearchIndexError::unavailable("429"),
                                true,
                            );
                        }
                    }
                    BatchOperationResult::succeeded(&r.id)
                })
                .collect();

            Ok(BatchOperationSummary::from_results(results))
        }

        async fn indices_for_alias(&self, _alias: &str) -> Result<Vec<String>, SearchIndexError> {
            Ok(self.aliased.clone())
        }

        async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError> {
            self.alias_update_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = &self.alias_update_error {
                return Err(e.clone());
            }
            self.alias_actions.lock().await.extend(actions.iter().cloned());
            Ok(())
        }
    }

    fn fast_config(chunk_size: usize, max_retries: usize) -> SearchIndexServiceConfig {
        SearchIndexServiceConfig::new(chunk_size, max_retries)
            .unwrap()
            .with_backoff(Duration::from_millis(1), Duration::from_millis(2))
    }

    fn docs(n: usize) -> Vec<IndexDocumentRequest> {
        (0..n)
            .map(|i| IndexDocumentRequest::new(format!("doc_{}", i), json!({ "n": i })))
            .collect()
    }

    #[tokio::test]
    async fn test_bulk_index_chunks_requests() {
        let provider = MockProvider::default();
        let sizes = provider.batch_sizes.clone();
        let service = SearchIndexService::with_config(Box::new(provider), fast_config(500, 5));

        let summary = service.bulk_index("idx", docs(1200)).await.unwrap();

        assert_eq!(summary.total, 1200);
        assert_eq!(summary.succeeded, 1200);
        assert_eq!(*sizes.lock().await, vec![500, 500, 200]);
    }

    #[tokio::test]
    async fn test_bulk_index_counts_permanent_failures_without_retry() {
        let provider = MockProvider {
            rejected: vec!["doc_3".to_string(), "doc_7".to_string()],
            ..Default::default()
        };
        let calls = provider.bulk_calls.clone();
        let service = SearchIndexService::with_config(Box::new(provider), fast_config(500, 5));

        let summary = service.bulk_index("idx", docs(10)).await.unwrap();

        assert_eq!(summary.succeeded, 8);
        assert_eq!(summary.failed, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let failed: Vec<&str> = summary.failures().map(|r| r.id.as_str()).collect();
        assert_eq!(failed, vec!["doc_3", "doc_7"]);
    }

    #[tokio::test]
    async fn test_bulk_index_retries_only_transient_failures() {
        let provider = MockProvider::default();
        provider
            .throttled
            .lock()
            .await
            .insert("doc_1".to_string(), 2);
        let sizes = provider.batch_sizes.clone();
        let service = SearchIndexService::with_config(Box::new(provider), fast_config(500, 5));

        let summary = service.bulk_index("idx", docs(4)).await.unwrap();

        assert_eq!(summary.succeeded, 4);
        assert_eq!(summary.failed, 0);
        assert_eq!(*sizes.lock().await, vec![4, 1, 1]);
        assert_eq!(summary.results[1].id, "doc_1");
        assert!(summary.results[1].success);
    }

    #[tokio::test]
    async fn test_bulk_index_gives_up_after_retry_budget() {
        let provider = MockProvider::default();
        provider
            .throttled
            .lock()
            .await
            .insert("doc_0".to_string(), 100);
        let calls = provider.bulk_calls.clone();
        let service = SearchIndexService::with_config(Box::new(provider), fast_config(500, 3));

        let summary = service.bulk_index("idx", docs(2)).await.unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.results[0].retryable);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_bulk_index_connection_error_aborts() {
        let provider = MockProvider {
            whole_request_error: Some(SearchIndexError::connection("connection refused")),
            ..Default::default()
        };
        let calls = provider.bulk_calls.clone();
        let service = SearchIndexService::with_config(Box::new(provider), fast_config(500, 5));

        let result = service.bulk_index("idx", docs(3)).await;

        assert!(matches!(result, Err(SearchIndexError::ConnectionError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bulk_index_whole_request_unavailable_is_retried() {
        let provider = MockProvider {
            whole_request_error: Some(SearchIndexError::unavailable("503")),
            ..Default::default()
        };
        let calls = provider.bulk_calls.clone();
        let service = SearchIndexService::with_config(Box::new(provider), fast_config(500, 2));

        let summary = service.bulk_index("idx", docs(3)).await.unwrap();

        assert_eq!(summary.failed, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_bulk_index_empty_input() {
        let provider = MockProvider::default();
        let calls = provider.bulk_calls.clone();
        let service = SearchIndexService::new(Box::new(provider));

        let summary = service.bulk_index("idx", vec![]).await.unwrap();

        assert_eq!(summary.total, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bulk_index_rejects_empty_index_name() {
        let service = SearchIndexService::new(Box::new(MockProvider::default()));
        let result = service.bulk_index("  ", docs(1)).await;
        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_swap_aliases_moves_alias() {
        let provider = MockProvider {
            aliased: vec!["gst-20230101-000000".to_string()],
            ..Default::default()
        };
        let actions = provider.alias_actions.clone();
        let service = SearchIndexService::new(Box::new(provider));

        let removed = service
            .swap_aliases(&[("gst-docs", "gst-20230908-140509")])
            .await
            .unwrap();

        assert_eq!(removed, vec!["gst-20230101-000000".to_string()]);
        let actions = actions.lock().await;
        assert_eq!(actions.len(), 2);
        assert!(matches!(&actions[0], AliasAction::Remove { index, .. } if index == "gst-20230101-000000"));
        assert!(matches!(&actions[1], AliasAction::Add { index, .. } if index == "gst-20230908-140509"));
    }

    #[tokio::test]
    async fn test_swap_aliases_sends_one_update_for_all_pairs() {
        let provider = MockProvider::default();
        let calls = provider.alias_update_calls.clone();
        let actions = provider.alias_actions.clone();
        let service = SearchIndexService::new(Box::new(provider));

        service
            .swap_aliases(&[
                ("gst-docs", "gst-20230908-140509"),
                ("gst-docs-metadata", "gst-20230908-140509-metadata"),
            ])
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let actions = actions.lock().await;
        assert_eq!(
            *actions,
            vec![
                AliasAction::Add {
                    index: "gst-20230908-140509".to_string(),
                    alias: "gst-docs".to_string(),
                },
                AliasAction::Add {
                    index: "gst-20230908-140509-metadata".to_string(),
                    alias: "gst-docs-metadata".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_alias_update_moves_nothing() {
        let provider = MockProvider {
            aliased: vec!["gst-20230101-000000".to_string()],
            alias_update_error: Some(SearchIndexError::unavailable("status 503")),
            ..Default::default()
        };
        let calls = provider.alias_update_calls.clone();
        let actions = provider.alias_actions.clone();
        let service = SearchIndexService::new(Box::new(provider));

        let result = service
            .swap_aliases(&[
                ("gst-docs", "gst-20230908-140509"),
                ("gst-docs-metadata", "gst-20230908-140509-metadata"),
            ])
            .await;

        assert!(matches!(result, Err(SearchIndexError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(actions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_swap_aliases_rejects_empty_alias() {
        let service = SearchIndexService::new(Box::new(MockProvider::default()));
        let result = service.swap_aliases(&[(" ", "gst-20230908-140509")]).await;
        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));
    }
}
