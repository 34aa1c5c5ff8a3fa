//! # GST Indexer
//!
//! Builds the Global Stocktake search index: merges scraper metadata and
//! concept spans onto parsed documents, flattens them into one search record
//! per text block and bulk loads the records into OpenSearch.
//!
//! ## Architecture
//!
//! The indexer follows the Reader-Processor-Loader pattern:
//!
//! 1. **Reader**: Loads the scraper CSV, parsed documents and concept spans
//! 2. **Processor**: Merges metadata, attaches spans, flattens blocks, builds facets
//! 3. **Loader**: Creates indices, bulk loads records and swaps aliases
//! 4. **Orchestrator**: Runs the stages in order
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`reader`]: Input file readers
//! - [`processor`]: Transforms documents into search records
//! - [`loader`]: Writes into OpenSearch
//! - [`orchestrator`]: Coordinates a run
//! - [`errors`]: Error types for the indexer

pub mod config;
pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod reader;

pub use config::{ConceptConfig, Dependencies, IndexerConfig};
pub use errors::IngestError;

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A concept selected for indexing has no full/partial passage classification.
    #[error("Concept {0:?} is not classified as full or partial passage")]
    ConceptNotClassified(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

impl From<gst_indexer_repository::SearchIndexError> for IndexingError {
    fn from(err: gst_indexer_repository::SearchIndexError) -> Self {
        Self::IngestError(IngestError::SearchIndex(err))
    }
}
