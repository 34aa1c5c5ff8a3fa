//! Parsed document types and the metadata merged onto them.
//!
//! `ParsedDocument` mirrors the JSON written by the document parser (one file
//! per document). `MergedDocument` is a parsed document with its scraper
//! metadata attached, which is what the rest of the pipeline works with.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A block of text extracted from a document by the parser.
///
/// Blocks are stored in reading order; that order is used to compute the
/// text before and after each block when flattening.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextBlock {
    /// Lines of text making up the block.
    pub text: Vec<String>,
    /// Identifier of the block, unique within its document.
    pub text_block_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Layout type assigned by the parser (e.g. `Text`, `Title`, `List`).
    #[serde(rename = "type", default = "default_block_type")]
    pub block_type: String,
    #[serde(default = "default_type_confidence")]
    pub type_confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Vec<[f64; 2]>>,
    /// Zero-based page number, or -1 for blocks from HTML sources.
    #[serde(default = "default_page_number")]
    pub page_number: i64,
}

fn default_block_type() -> String {
    "Text".to_string()
}

fn default_type_confidence() -> f64 {
    1.0
}

fn default_page_number() -> i64 {
    -1
}

impl TextBlock {
    /// The block's text as a single string, each line trimmed and joined by a space.
    pub fn to_text(&self) -> String {
        self.text
            .iter()
            .map(|line| line.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Text blocks extracted from an HTML source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HtmlData {
    #[serde(default)]
    pub text_blocks: Vec<TextBlock>,
}

/// Text blocks extracted from a PDF source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PdfData {
    #[serde(default)]
    pub text_blocks: Vec<TextBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5sum: Option<String>,
}

/// A document as written by the parser, before metadata is attached.
///
/// Unknown fields in the parser output (page metadata, the parser's own
/// `document_metadata`) are ignored; metadata is always taken from the
/// scraper CSV instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedDocument {
    pub document_id: String,
    pub document_name: String,
    #[serde(default)]
    pub document_description: Option<String>,
    #[serde(default)]
    pub document_source_url: Option<String>,
    #[serde(default)]
    pub document_cdn_object: Option<String>,
    #[serde(default)]
    pub document_content_type: Option<String>,
    #[serde(default)]
    pub document_md5_sum: Option<String>,
    #[serde(default)]
    pub document_slug: Option<String>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub translated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_data: Option<HtmlData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_data: Option<PdfData>,
}

impl ParsedDocument {
    /// The document's text blocks in reading order.
    ///
    /// PDF blocks take precedence over HTML blocks. Documents with neither
    /// have no blocks.
    pub fn text_blocks(&self) -> &[TextBlock] {
        if let Some(pdf) = &self.pdf_data {
            return &pdf.text_blocks;
        }
        if let Some(html) = &self.html_data {
            return &html.text_blocks;
        }
        &[]
    }

    /// Returns true if the parser detected English as one of the document's languages.
    pub fn is_english(&self) -> bool {
        self.languages
            .as_ref()
            .map(|langs| langs.iter().any(|l| l.eq_ignore_ascii_case("en")))
            .unwrap_or(false)
    }
}

/// Normalised document metadata, built from one row of the scraper CSV.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    /// Authoring entities, split from the comma-separated `Author` column.
    pub author: Vec<String>,
    /// True if the author is a party to the convention (a national government).
    pub author_is_party: bool,
    /// Submission types, split from the comma-separated `Submission Type` column.
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub date: Option<NaiveDate>,
    /// Source link of the submitted document.
    pub link: Option<String>,
    pub document_variant: Option<String>,
    pub geography_iso: Option<String>,
    pub party: Option<String>,
    pub theme: Option<String>,
    pub topics: Vec<String>,
    pub language: Option<String>,
    pub translation: Option<String>,
    pub data_error_type: Option<String>,
    pub source: Option<String>,
}

/// A parsed document enriched with its scraper metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedDocument {
    #[serde(flatten)]
    pub document: ParsedDocument,
    pub document_metadata: DocumentMetadata,
}

impl MergedDocument {
    pub fn document_id(&self) -> &str {
        &self.document.document_id
    }

    pub fn text_blocks(&self) -> &[TextBlock] {
        self.document.text_blocks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, lines: &[&str]) -> TextBlock {
        TextBlock {
            text: lines.iter().map(|l| l.to_string()).collect(),
            text_block_id: id.to_string(),
            language: None,
            block_type: "Text".to_string(),
            type_confidence: 1.0,
            coords: None,
            page_number: 0,
        }
    }

    #[test]
    fn test_to_text_trims_and_joins_lines() {
        let b = block("p0_b0", &["  Coal is ", "burned.  "]);
        assert_eq!(b.to_text(), "Coal is burned.");
    }

    #[test]
    fn test_deserialize_parser_output() {
        let json = r#"{
            "document_id": "UNFCCC.party.1.0",
            "document_name": "Submission",
            "document_metadata": {"ignored": true},
            "languages": ["en"],
            "pdf_data": {
                "page_metadata": [],
                "md5sum": "abc",
                "text_blocks": [
                    {"text": ["Hello"], "text_block_id": "p0_b0", "type": "Title", "type_confidence": 0.9, "page_number": 0}
                ]
            }
        }"#;

        let doc: ParsedDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.document_id, "UNFCCC.party.1.0");
        assert!(doc.is_english());
        assert!(!doc.translated);
        assert_eq!(doc.text_blocks().len(), 1);
        assert_eq!(doc.text_blocks()[0].block_type, "Title");
    }

    #[test]
    fn test_text_blocks_prefers_pdf_data() {
        let doc = ParsedDocument {
            document_id: "D1".to_string(),
            document_name: "Doc".to_string(),
            document_description: None,
            document_source_url: None,
            document_cdn_object: None,
            document_content_type: None,
            document_md5_sum: None,
            document_slug: None,
            languages: None,
            translated: false,
            html_data: Some(HtmlData {
                text_blocks: vec![block("h0", &["html"])],
            }),
            pdf_data: Some(PdfData {
                text_blocks: vec![block("p0", &["pdf"]), block("p1", &["pdf"])],
                md5sum: None,
            }),
        };

        assert_eq!(doc.text_blocks().len(), 2);
        assert!(!doc.is_english());
    }

    #[test]
    fn test_metadata_date_serializes_as_iso() {
        let metadata = DocumentMetadata {
            date: NaiveDate::from_ymd_opt(2023, 6, 15),
            ..Default::default()
        };

        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["date"], "2023-06-15");
        assert!(value["type"].is_array());
    }
}
