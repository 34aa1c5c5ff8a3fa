//! Readers for the indexer's input files.
//!
//! - [`scraper`]: scraper metadata CSV
//! - [`documents`]: parsed document JSON directory
//! - [`spans`]: concept span CSVs

pub mod documents;
pub mod scraper;
pub mod spans;

pub use documents::{load_parsed_documents, LoadedDocuments};
pub use scraper::{ScraperMetadata, ScraperRow};
pub use spans::{concept_display_name, load_concept_spans, normalize_subtype, ConceptSpans};
