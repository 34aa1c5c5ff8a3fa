//! Processor module for the GST indexer.
//!
//! Transforms parsed documents into search records:
//!
//! - [`merger`]: attaches scraper metadata
//! - [`span_index`]: maps text blocks to their concept spans
//! - [`flattener`]: one search record per text block
//! - [`html`]: block text as HTML with highlighted spans
//! - [`facets`]: corpus-wide filter values

pub mod facets;
pub mod flattener;
pub mod html;
pub mod merger;
pub mod span_index;

pub use facets::build_facets;
pub use flattener::{flatten_corpus, flatten_document, normalize_whitespace};
pub use merger::{merge_corpus, merge_metadata, MergeOutcome};
pub use span_index::{SpanIndex, SpanPolicy};
