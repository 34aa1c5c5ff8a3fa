//! # GST Indexer Repository
//!
//! This crate provides traits and implementations for writing to the search
//! index. It includes definitions for errors, interfaces, the chunked bulk
//! loading service, and a concrete implementation for OpenSearch.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod service;
pub mod types;
pub mod utils;

pub use config::SearchIndexServiceConfig;
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use opensearch::{BasicAuth, OpenSearchProvider};
pub use service::SearchIndexService;
pub use types::{AliasAction, BatchOperationResult, BatchOperationSummary, IndexDocumentRequest};
