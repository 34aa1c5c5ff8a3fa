//! Request and response types for search index operations.

use serde_json::{json, Value};

use crate::errors::SearchIndexError;

/// A document to write into an index under a fixed id.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocumentRequest {
    /// The document id in the index.
    pub id: String,
    /// The JSON source of the document.
    pub body: Value,
}

impl IndexDocumentRequest {
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }
}

/// A single action of an atomic alias update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasAction {
    /// Point `alias` at `index`.
    Add { index: String, alias: String },
    /// Stop pointing `alias` at `index`.
    Remove { index: String, alias: String },
}

impl AliasAction {
    /// The action in the shape expected by the `_aliases` API.
    pub fn to_json(&self) -> Value {
        match self {
            AliasAction::Add { index, alias } => json!({ "add": { "index": index, "alias": alias } }),
            AliasAction::Remove { index, alias } => {
                json!({ "remove": { "index": index, "alias": alias } })
            }
        }
    }
}

/// Result of a batch operation for a single item.
///
/// Represents the outcome of writing one document within a bulk request. A
/// failed item is `retryable` when the backend rejected it for capacity
/// reasons (HTTP 429 or 5xx) rather than because the document was invalid.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The document id.
    pub id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Whether a failed operation may succeed if sent again.
    pub retryable: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

impl BatchOperationResult {
    pub fn succeeded(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: true,
            retryable: false,
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, error: SearchIndexError, retryable: bool) -> Self {
        Self {
            id: id.into(),
            success: false,
            retryable,
            error: Some(error),
        }
    }
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// Lets callers handle partial failures: individual document failures are
/// reported here instead of failing the whole operation.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-item results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Iterate over failed items.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
