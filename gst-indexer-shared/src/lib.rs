//! # GST Indexer Shared
//!
//! This crate defines the data structures passed between the stages of the
//! GST indexing pipeline: parsed documents and their text blocks, the
//! metadata merged onto them, concept spans, and the flat search records
//! and filter facets that end up in the search index.

pub mod types;

pub use types::document::{
    DocumentMetadata, HtmlData, MergedDocument, ParsedDocument, PdfData, TextBlock,
};
pub use types::filter_facets::{FilterFacets, FILTERS_DOCUMENT_ID};
pub use types::search_record::SearchRecord;
pub use types::span::{concept_label, wildcard_label, PassageKind, Span, LABEL_SEPARATOR};
