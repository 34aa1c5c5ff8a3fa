//! This module defines the core data structures used across the GST indexer.
//! It re-exports the document, span, record and facet types.

pub mod document;
pub mod filter_facets;
pub mod search_record;
pub mod span;

pub use document::{DocumentMetadata, MergedDocument, ParsedDocument, TextBlock};
pub use filter_facets::FilterFacets;
pub use search_record::SearchRecord;
pub use span::{PassageKind, Span};
