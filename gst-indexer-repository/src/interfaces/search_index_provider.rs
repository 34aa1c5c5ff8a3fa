//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::{AliasAction, BatchOperationSummary, IndexDocumentRequest};

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are injected into `SearchIndexService` so that the
/// indexing pipeline can be exercised against mock backends in tests.
///
/// Errors follow one convention: an error that describes the whole request
/// (unreachable cluster, rejected credentials, 429/5xx) is returned as `Err`,
/// while per-document failures inside a bulk request are reported through
/// [`BatchOperationSummary`].
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Check that the backend is reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the backend answered
    /// * `Err(SearchIndexError::ConnectionError)` - If it could not be reached
    async fn ping(&self) -> Result<(), SearchIndexError>;

    /// Create an index with the given settings and mappings.
    ///
    /// # Arguments
    ///
    /// * `index` - The name of the index to create
    /// * `settings` - The request body holding `settings` and `mappings`
    async fn create_index(&self, index: &str, settings: &Value) -> Result<(), SearchIndexError>;

    /// Write a single document, replacing any existing document with the same id.
    async fn index_document(
        &self,
        index: &str,
        request: &IndexDocumentRequest,
    ) -> Result<(), SearchIndexError>;

    /// Write documents in one bulk request and report the outcome per document.
    ///
    /// # Arguments
    ///
    /// * `index` - The target index
    /// * `requests` - The documents to write
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - One result per request, in request order
    /// * `Err(SearchIndexError)` - If the request as a whole was not accepted
    async fn bulk_index_documents(
        &self,
        index: &str,
        requests: &[IndexDocumentRequest],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Names of the indices that `alias` currently points at; empty if the alias does not exist.
    async fn indices_for_alias(&self, alias: &str) -> Result<Vec<String>, SearchIndexError>;

    /// Apply alias actions atomically.
    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError>;
}
