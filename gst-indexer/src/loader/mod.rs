//! Loader module for the GST indexer.
//!
//! Writes search records and the facets document into freshly created
//! indices and moves the public aliases onto them.

use chrono::{DateTime, Utc};
use gst_indexer_repository::opensearch::{
    get_index_settings, get_metadata_index_settings, metadata_index_name, timestamped_index_name,
};
use gst_indexer_repository::{IndexDocumentRequest, SearchIndexService};
use gst_indexer_shared::{FilterFacets, SearchRecord, FILTERS_DOCUMENT_ID};
use tracing::{error, info, instrument, warn};

use crate::errors::IngestError;

/// Suffix of the alias that points at the metadata index.
const METADATA_ALIAS_SUFFIX: &str = "-metadata";

/// Names of the indices written by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNames {
    /// The passage index.
    pub index: String,
    /// The companion index holding the facets document.
    pub metadata_index: String,
}

impl IndexNames {
    /// Names for a run started at `now`.
    pub fn timestamped(prefix: &str, now: DateTime<Utc>) -> Self {
        let index = timestamped_index_name(prefix, now);
        Self {
            metadata_index: metadata_index_name(&index),
            index,
        }
    }
}

/// A record the search index did not accept.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of loading the search records.
#[derive(Debug, Clone, Default)]
pub struct BulkLoadReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<LoadFailure>,
}

/// Loader that writes into the search engine.
pub struct SearchLoader {
    service: SearchIndexService,
}

impl SearchLoader {
    /// Create a new search loader on top of the given service.
    pub fn new(service: SearchIndexService) -> Self {
        Self { service }
    }

    /// Check that the search backend is reachable.
    pub async fn check_ready(&self) -> Result<(), IngestError> {
        self.service.ping().await.map_err(IngestError::from)
    }

    /// Create the passage and metadata indices.
    #[instrument(skip(self))]
    pub async fn create_indices(&self, names: &IndexNames) -> Result<(), IngestError> {
        self.service
            .create_index(&names.index, &get_index_settings())
            .await?;
        self.service
            .create_index(&names.metadata_index, &get_metadata_index_settings())
            .await?;
        info!(index = %names.index, metadata_index = %names.metadata_index, "Created indices");
        Ok(())
    }

    /// Bulk load `records` into `index`.
    ///
    /// Records the index rejects are reported, not returned as errors.
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub async fn load_records(
        &self,
        index: &str,
        records: &[SearchRecord],
    ) -> Result<BulkLoadReport, IngestError> {
        let requests = records
            .iter()
            .map(|record| {
                serde_json::to_value(record)
                    .map(|body| IndexDocumentRequest::new(record.record_id(), body))
                    .map_err(|e| IngestError::json(format!("record {}", record.record_id()), e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let summary = self.service.bulk_index(index, requests).await.map_err(|e| {
            error!(error = %e, index = %index, "Bulk load aborted");
            IngestError::from(e)
        })?;

        let failures: Vec<LoadFailure> = summary
            .failures()
            .map(|r| LoadFailure {
                id: r.id.clone(),
                reason: r
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            })
            .collect();

        if !failures.is_empty() {
            warn!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Bulk load completed with some failures"
            );
            for failure in &failures {
                warn!(id = %failure.id, reason = %failure.reason, "Record not indexed");
            }
        }

        Ok(BulkLoadReport {
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            failures,
        })
    }

    /// Write the facets document into the metadata index.
    pub async fn write_facets(
        &self,
        metadata_index: &str,
        facets: &FilterFacets,
    ) -> Result<(), IngestError> {
        let body = serde_json::to_value(facets).map_err(|e| IngestError::json("filter facets", e))?;
        self.service
            .index_document(metadata_index, IndexDocumentRequest::new(FILTERS_DOCUMENT_ID, body))
            .await?;
        info!(index = %metadata_index, "Wrote filter facets");
        Ok(())
    }

    /// Point `alias` at the new passage index and `<alias>-metadata` at the
    /// new metadata index, both in the same alias update.
    #[instrument(skip(self))]
    pub async fn swap_aliases(&self, names: &IndexNames, alias: &str) -> Result<(), IngestError> {
        let metadata_alias = format!("{}{}", alias, METADATA_ALIAS_SUFFIX);
        self.service
            .swap_aliases(&[
                (alias, names.index.as_str()),
                (metadata_alias.as_str(), names.metadata_index.as_str()),
            ])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use gst_indexer_repository::{
        AliasAction, BatchOperationResult, BatchOperationSummary, SearchIndexError,
        SearchIndexProvider,
    };
    use gst_indexer_shared::DocumentMetadata;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Mock search provider for testing.
    #[derive(Default)]
    struct MockSearchProvider {
        created: Arc<Mutex<Vec<String>>>,
        indexed: Arc<Mutex<Vec<(String, IndexDocumentRequest)>>>,
        aliases: Arc<Mutex<Vec<AliasAction>>>,
        alias_update_calls: Arc<AtomicUsize>,
        fail_alias_update: bool,
    }

    #[async_trait]
    impl SearchIndexProvider for MockSearchProvider {
        async fn ping(&self) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn create_index(&self, index: &str, _settings: &Value) -> Result<(), SearchIndexError> {
            self.created.lock().unwrap().push(index.to_string());
            Ok(())
        }

        async fn index_document(
            &self,
            index: &str,
            request: &IndexDocumentRequest,
        ) -> Result<(), SearchIndexError> {
            self.indexed
                .lock()
                .unwrap()
                .push((index.to_string(), request.clone()));
            Ok(())
        }

        async fn bulk_index_documents(
            &self,
            _index: &str,
            requests: &[IndexDocumentRequest],
        ) -> Result<BatchOperationSummary, SearchIndexError> {
            Ok(BatchOperationSummary::from_results(
                requests
                    .iter()
                    .map(|r| {
                        if r.body["text"] == "bad" {
                            BatchOperationResult::failed(
                                &r.id,
                                SearchIndexError::index("mapper_parsing_exception"),
                                false,
                            )
                        } else {
                            BatchOperationResult::succeeded(&r.id)
                        }
                    })
                    .collect(),
            ))
        }

        async fn indices_for_alias(&self, _alias: &str) -> Result<Vec<String>, SearchIndexError> {
            Ok(vec![])
        }

        async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError> {
            self.alias_update_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_alias_update {
                return Err(SearchIndexError::unavailable("status 503"));
            }
            self.aliases.lock().unwrap().extend(actions.iter().cloned());
            Ok(())
        }
    }

    fn record(block: &str, text: &str) -> SearchRecord {
        SearchRecord {
            document_id: "DOC".to_string(),
            document_name: "Doc".to_string(),
            document_description: None,
            document_source_url: None,
            document_md5_sum: None,
            document_slug: None,
            languages: vec![],
            translated: false,
            document_metadata: DocumentMetadata::default(),
            text_block_id: block.to_string(),
            page_number: 0,
            block_type: "Text".to_string(),
            type_confidence: 1.0,
            text_before: String::new(),
            text: text.to_string(),
            text_after: String::new(),
            text_html: text.to_string(),
            span_types: vec![],
            span_types_full_passage: vec![],
            span_ids: vec![],
            is_party: false,
            date_string: None,
        }
    }

    fn names() -> IndexNames {
        IndexNames::timestamped("gst", Utc.with_ymd_and_hms(2023, 9, 8, 14, 5, 9).unwrap())
    }

    #[test]
    fn test_index_names() {
        let names = names();
        assert_eq!(names.index, "gst-20230908-140509");
        assert_eq!(names.metadata_index, "gst-20230908-140509-metadata");
    }

    #[tokio::test]
    async fn test_load_records_reports_failures() {
        let loader = SearchLoader::new(SearchIndexService::new(Box::new(
            MockSearchProvider::default(),
        )));

        let report = loader
            .load_records("gst", &[record("b0", "good"), record("b1", "bad")])
            .await
            .unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].id, "DOC_b1");
        assert!(report.failures[0].reason.contains("mapper_parsing_exception"));
    }

    #[tokio::test]
    async fn test_create_indices_write_facets_and_swap_aliases() {
        let provider = MockSearchProvider::default();
        let created = provider.created.clone();
        let indexed = provider.indexed.clone();
        let aliases = provider.aliases.clone();
        let alias_update_calls = provider.alias_update_calls.clone();
        let loader = SearchLoader::new(SearchIndexService::new(Box::new(provider)));
        let names = names();

        loader.create_indices(&names).await.unwrap();
        loader
            .write_facets(&names.metadata_index, &FilterFacets::default())
            .await
            .unwrap();
        loader.swap_aliases(&names, "gst-docs").await.unwrap();

        assert_eq!(
            *created.lock().unwrap(),
            vec![names.index.clone(), names.metadata_index.clone()]
        );

        let indexed = indexed.lock().unwrap();
        assert_eq!(indexed[0].0, names.metadata_index);
        assert_eq!(indexed[0].1.id, "filters");

        assert_eq!(
            *aliases.lock().unwrap(),
            vec![
                AliasAction::Add {
                    index: names.index.clone(),
                    alias: "gst-docs".to_string(),
                },
                AliasAction::Add {
                    index: names.metadata_index.clone(),
                    alias: "gst-docs-metadata".to_string(),
                },
            ]
        );
        assert_eq!(alias_update_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_alias_update_leaves_both_aliases() {
        let provider = MockSearchProvider {
            fail_alias_update: true,
            ..Default::default()
        };
        let aliases = provider.aliases.clone();
        let alias_update_calls = provider.alias_update_calls.clone();
        let loader = SearchLoader::new(SearchIndexService::new(Box::new(provider)));

        let result = loader.swap_aliases(&names(), "gst-docs").await;

        assert!(matches!(
            result,
            Err(IngestError::SearchIndex(SearchIndexError::Unavailable(_)))
        ));
        assert_eq!(alias_update_calls.load(Ordering::SeqCst), 1);
        assert!(aliases.lock().unwrap().is_empty());
    }
}
