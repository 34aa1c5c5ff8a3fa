//! Error types for the GST indexer ingest.

use std::path::{Path, PathBuf};

use gst_indexer_repository::SearchIndexError;
use thiserror::Error;

/// Errors that can occur while reading, merging or loading documents.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Failed to read a file or directory.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read or decode a CSV file.
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to decode or encode JSON.
    #[error("JSON error in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The scraper CSV has no row for a parsed document.
    #[error("No scraper metadata for document {document_id}")]
    MissingMetadata { document_id: String },

    /// The scraper CSV has a date that cannot be parsed.
    #[error("Invalid date {value:?} for document {document_id}")]
    InvalidDate { document_id: String, value: String },

    /// A span refers to a document that is not in the corpus.
    #[error("Span {span_id} refers to unknown document {document_id}")]
    UnknownDocument {
        document_id: String,
        span_id: String,
    },

    /// A span refers to a text block that is not in its document.
    #[error("Span {span_id} refers to unknown text block {text_block_id} of document {document_id}")]
    UnknownTextBlock {
        document_id: String,
        text_block_id: String,
        span_id: String,
    },

    /// Error from the loader component.
    #[error("Loader error: {0}")]
    LoaderError(String),

    /// Error from the search index.
    #[error("Search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),
}

impl IngestError {
    /// Create an I/O error for `path`.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a CSV error for `path`.
    pub fn csv(path: impl AsRef<Path>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a JSON error with a short description of what was being decoded.
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    /// Create a loader error.
    pub fn loader(msg: impl Into<String>) -> Self {
        Self::LoaderError(msg.into())
    }

    /// Returns true for errors that only affect a single document.
    ///
    /// The pipeline skips the document and carries on for these.
    pub fn is_per_document(&self) -> bool {
        matches!(
            self,
            Self::MissingMetadata { .. } | Self::InvalidDate { .. }
        )
    }
}
