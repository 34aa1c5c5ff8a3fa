//! Flat search record types.
//!
//! One `SearchRecord` is indexed per text block. It carries the document-level
//! fields alongside the block's own fields so that every search hit can be
//! rendered and filtered without a second lookup.

use serde::{Deserialize, Serialize};

use crate::types::document::DocumentMetadata;

/// Document representation for the search index, one per text block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRecord {
    pub document_id: String,
    pub document_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_md5_sum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_slug: Option<String>,
    pub languages: Vec<String>,
    pub translated: bool,
    pub document_metadata: DocumentMetadata,

    pub text_block_id: String,
    pub page_number: i64,
    /// Layout type of the block.
    #[serde(rename = "type")]
    pub block_type: String,
    pub type_confidence: f64,

    /// Whitespace-normalised text of the previous block, empty for the first block.
    pub text_before: String,
    pub text: String,
    /// Whitespace-normalised text of the next block, empty for the last block.
    pub text_after: String,
    /// The block text as HTML with partial-passage spans highlighted.
    pub text_html: String,

    /// Sorted span labels on the block, including `<Concept> – All` wildcards.
    pub span_types: Vec<String>,
    /// As `span_types`, restricted to full-passage concepts.
    pub span_types_full_passage: Vec<String>,
    pub span_ids: Vec<String>,

    pub is_party: bool,
    /// Document date as `YYYY-MM-DD`.
    pub date_string: Option<String>,
}

impl SearchRecord {
    /// The id used for the record in the search index.
    ///
    /// Built from the document and block ids so that re-indexing the same
    /// corpus produces the same ids.
    pub fn record_id(&self) -> String {
        format!("{}_{}", self.document_id, self.text_block_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SearchRecord {
        SearchRecord {
            document_id: "UNFCCC.party.1.0".to_string(),
            document_name: "Submission".to_string(),
            document_description: None,
            document_source_url: None,
            document_md5_sum: None,
            document_slug: None,
            languages: vec!["en".to_string()],
            translated: false,
            document_metadata: DocumentMetadata::default(),
            text_block_id: "p1_b3".to_string(),
            page_number: 1,
            block_type: "Text".to_string(),
            type_confidence: 1.0,
            text_before: String::new(),
            text: "Coal".to_string(),
            text_after: String::new(),
            text_html: "Coal".to_string(),
            span_types: vec![],
            span_types_full_passage: vec![],
            span_ids: vec![],
            is_party: true,
            date_string: None,
        }
    }

    #[test]
    fn test_record_id() {
        assert_eq!(record().record_id(), "UNFCCC.party.1.0_p1_b3");
    }

    #[test]
    fn test_serialization_omits_empty_optionals() {
        let value = serde_json::to_value(record()).unwrap();

        assert!(value.get("document_description").is_none());
        assert_eq!(value["type"], "Text");
        assert!(value["date_string"].is_null());
        assert_eq!(value["is_party"], true);
    }
}
