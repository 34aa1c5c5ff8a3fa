//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesGetAliasParts},
    BulkParts, IndexParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::types::{AliasAction, BatchOperationResult, BatchOperationSummary, IndexDocumentRequest};
use crate::utils::{is_retryable_status, is_success_status};

/// Timeout applied to every bulk request.
const BULK_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Credentials for HTTP basic authentication.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// OpenSearch provider implementation.
///
/// # Example
///
/// ```ignore
/// use gst_indexer_repository::{OpenSearchProvider, SearchIndexProvider};
///
/// let provider = OpenSearchProvider::new("http://localhost:9200", None)?;
/// provider.ping().await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider for the specified URL.
    ///
    /// No request is sent; use [`SearchIndexProvider::ping`] to check connectivity.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `auth` - Optional basic-auth credentials
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or the transport cannot be built
    pub fn new(url: &str, auth: Option<BasicAuth>) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let Some(auth) = auth {
            builder = builder.auth(Credentials::Basic(auth.username, auth.password));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        info!(url = %url, "Created OpenSearch provider");

        Ok(Self {
            client: OpenSearch::new(transport),
        })
    }

    /// Build the newline-delimited body of a bulk request.
    fn bulk_body(requests: &[IndexDocumentRequest]) -> Vec<JsonBody<Value>> {
        let mut body = Vec::with_capacity(requests.len() * 2);
        for request in requests {
            body.push(json!({ "index": { "_id": request.id } }).into());
            body.push(request.body.clone().into());
        }
        body
    }

    /// Map a bulk response body onto per-request results.
    ///
    /// Items in the response are in request order.
    fn parse_bulk_response(
        requests: &[IndexDocumentRequest],
        body: &Value,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let items = body["items"]
            .as_array()
            .ok_or_else(|| SearchIndexError::parse("Bulk response has no items"))?;

        if items.len() != requests.len() {
            return Err(SearchIndexError::parse(format!(
                "Bulk response has {} items for {} requests",
                items.len(),
                requests.len()
            )));
        }

        let results = requests
            .iter()
            .zip(items)
            .map(|(request, item)| {
                let outcome = item
                    .as_object()
                    .and_then(|actions| actions.values().next())
                    .cloned()
                    .unwrap_or(Value::Null);
                let status = outcome["status"].as_u64().unwrap_or(0) as u16;

                if is_success_status(status) {
                    BatchOperationResult::succeeded(&request.id)
                } else {
                    let reason = match &outcome["error"] {
                        Value::Object(error) => format!(
                            "{}: {}",
                            error.get("type").and_then(Value::as_str).unwrap_or("unknown"),
                            error.get("reason").and_then(Value::as_str).unwrap_or("")
                        ),
                        Value::Null => format!("status {}", status),
                        other => other.to_string(),
                    };
                    let retryable = is_retryable_status(status);
                    let error = if retryable {
                        SearchIndexError::unavailable(reason)
                    } else {
                        SearchIndexError::index(reason)
                    };
                    BatchOperationResult::failed(&request.id, error, retryable)
                }
            })
            .collect();

        Ok(BatchOperationSummary::from_results(results))
    }

    /// Turn a non-success response into an error, classifying it by status.
    async fn failure(
        response: Response,
        make_error: fn(String) -> SearchIndexError,
    ) -> SearchIndexError {
        let status = response.status_code().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(status = status, body = %body, "OpenSearch request failed");

        let message = format!("status {}: {}", status, body);
        if is_retryable_status(status) {
            SearchIndexError::unavailable(message)
        } else if status == 401 || status == 403 {
            SearchIndexError::connection(message)
        } else {
            make_error(message)
        }
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn ping(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(SearchIndexError::connection(format!(
                "Ping returned status {}",
                response.status_code()
            )));
        }

        debug!("OpenSearch ping succeeded");
        Ok(())
    }

    async fn create_index(&self, index: &str, settings: &Value) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(settings.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::failure(response, SearchIndexError::IndexCreationError).await);
        }

        info!(index = %index, "Created index");
        Ok(())
    }

    async fn index_document(
        &self,
        index: &str,
        request: &IndexDocumentRequest,
    ) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, &request.id))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::failure(response, SearchIndexError::IndexError).await);
        }

        debug!(index = %index, doc_id = %request.id, "Document indexed");
        Ok(())
    }

    async fn bulk_index_documents(
        &self,
        index: &str,
        requests: &[IndexDocumentRequest],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if requests.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .request_timeout(BULK_REQUEST_TIMEOUT)
            .body(Self::bulk_body(requests))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::failure(response, SearchIndexError::BulkIndexError).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = Self::parse_bulk_response(requests, &body)?;
        debug!(
            index = %index,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }

    async fn indices_for_alias(&self, alias: &str) -> Result<Vec<String>, SearchIndexError> {
        let response = self
            .client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if response.status_code().as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !response.status_code().is_success() {
            return Err(Self::failure(response, SearchIndexError::AliasError).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let mut indices: Vec<String> = body
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        indices.sort();
        Ok(indices)
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError> {
        let actions: Vec<Value> = actions.iter().map(AliasAction::to_json).collect();

        let response = self
            .client
            .indices()
            .update_aliases()
            .body(json!({ "actions": actions }))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::failure(response, SearchIndexError::AliasError).await);
        }

        info!(actions = actions.len(), "Aliases updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requests() -> Vec<IndexDocumentRequest> {
        vec![
            IndexDocumentRequest::new("doc_a", json!({ "text": "a" })),
            IndexDocumentRequest::new("doc_b", json!({ "text": "b" })),
            IndexDocumentRequest::new("doc_c", json!({ "text": "c" })),
        ]
    }

    #[test]
    fn test_bulk_body_interleaves_actions_and_sources() {
        let body = OpenSearchProvider::bulk_body(&requests());
        assert_eq!(body.len(), 6);
    }

    #[test]
    fn test_parse_bulk_response_classifies_items() {
        let body = json!({
            "took": 3,
            "errors": true,
            "items": [
                { "index": { "_id": "doc_a", "status": 201 } },
                { "index": { "_id": "doc_b", "status": 400,
                    "error": { "type": "mapper_parsing_exception", "reason": "failed to parse field [date_string]" } } },
                { "index": { "_id": "doc_c", "status": 429,
                    "error": { "type": "es_rejected_execution_exception", "reason": "queue full" } } }
            ]
        });

        let summary = OpenSearchProvider::parse_bulk_response(&requests(), &body).unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);

        let b = &summary.results[1];
        assert!(!b.success);
        assert!(!b.retryable);
        assert!(matches!(b.error, Some(SearchIndexError::IndexError(ref m)) if m.contains("mapper_parsing_exception")));

        let c = &summary.results[2];
        assert!(c.retryable);
        assert!(matches!(c.error, Some(SearchIndexError::Unavailable(_))));
    }

    #[test]
    fn test_parse_bulk_response_item_count_mismatch() {
        let body = json!({ "items": [ { "index": { "status": 201 } } ] });
        let result = OpenSearchProvider::parse_bulk_response(&requests(), &body);
        assert!(matches!(result, Err(SearchIndexError::ParseError(_))));
    }

    #[test]
    fn test_invalid_url_is_connection_error() {
        let result = OpenSearchProvider::new("not a url", None);
        assert!(matches!(result, Err(SearchIndexError::ConnectionError(_))));
    }
}
