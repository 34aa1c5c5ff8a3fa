//! Scraper metadata CSV reader.
//!
//! The scraper writes one row per submitted document. Rows are looked up by
//! document id, by the md5 checksum of the PDF, or by the PDF file name.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use gst_indexer_shared::ParsedDocument;
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use crate::errors::IngestError;

/// Cell values treated as missing.
const NULL_LIKE: &[&str] = &["", "nan", "NaN", "None", "null", "NULL", "N/A"];

fn nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        let trimmed = v.trim();
        if NULL_LIKE.contains(&trimmed) {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

/// One row of the scraper CSV with null-like cells normalised to `None`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ScraperRow {
    #[serde(rename = "CPR Document ID", default, deserialize_with = "nullable")]
    pub document_id: Option<String>,
    #[serde(rename = "Title", default, deserialize_with = "nullable")]
    pub title: Option<String>,
    #[serde(rename = "Author", default, deserialize_with = "nullable")]
    pub author: Option<String>,
    #[serde(rename = "Author Type", default, deserialize_with = "nullable")]
    pub author_type: Option<String>,
    #[serde(rename = "Submission Type", default, deserialize_with = "nullable")]
    pub submission_type: Option<String>,
    #[serde(rename = "Date", default, deserialize_with = "nullable")]
    pub date: Option<String>,
    #[serde(rename = "Documents", default, deserialize_with = "nullable")]
    pub documents: Option<String>,
    #[serde(rename = "Document Variant", default, deserialize_with = "nullable")]
    pub document_variant: Option<String>,
    #[serde(rename = "Geography ISO", default, deserialize_with = "nullable")]
    pub geography_iso: Option<String>,
    #[serde(rename = "Party", default, deserialize_with = "nullable")]
    pub party: Option<String>,
    #[serde(rename = "Theme", default, deserialize_with = "nullable")]
    pub theme: Option<String>,
    #[serde(rename = "Topics", default, deserialize_with = "nullable")]
    pub topics: Option<String>,
    #[serde(rename = "Language", default, deserialize_with = "nullable")]
    pub language: Option<String>,
    #[serde(rename = "Translation", default, deserialize_with = "nullable")]
    pub translation: Option<String>,
    #[serde(rename = "Data Error Type", default, deserialize_with = "nullable")]
    pub data_error_type: Option<String>,
    #[serde(rename = "Source", default, deserialize_with = "nullable")]
    pub source: Option<String>,
    #[serde(rename = "md5sum", default, deserialize_with = "nullable")]
    pub md5sum: Option<String>,
    /// File name of the PDF without its extension, derived from `Documents`.
    #[serde(skip)]
    pub pdf_name: Option<String>,
}

/// Derive the PDF name from a document link: the last path segment without
/// `.pdf`, with `%` characters removed.
pub fn pdf_name_from_link(link: &str) -> Option<String> {
    let segment = link.trim_end_matches('/').rsplit('/').next()?;
    let stem = segment.strip_suffix(".pdf").unwrap_or(segment);
    let name = stem.replace('%', "");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// The scraper table with lookup indices.
#[derive(Debug, Default)]
pub struct ScraperMetadata {
    rows: Vec<ScraperRow>,
    by_id: HashMap<String, usize>,
    by_md5: HashMap<String, usize>,
    by_pdf_name: HashMap<String, usize>,
}

impl ScraperMetadata {
    /// Read the scraper CSV at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| IngestError::csv(path, e))?;
        let metadata = Self::from_csv(reader, path)?;
        info!(path = %path.display(), rows = metadata.len(), "Loaded scraper metadata");
        Ok(metadata)
    }

    /// Read a scraper CSV from any reader. `source` names the input in errors.
    pub fn from_reader<R: Read>(reader: R, source: impl AsRef<Path>) -> Result<Self, IngestError> {
        let reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
        Self::from_csv(reader, source.as_ref())
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>, source: &Path) -> Result<Self, IngestError> {
        let mut metadata = Self::default();

        for (line, result) in reader.deserialize::<ScraperRow>().enumerate() {
            let mut row = result.map_err(|e| IngestError::csv(source, e))?;

            let Some(id) = row.document_id.clone() else {
                warn!(row = line + 1, "Skipping scraper row without a document id");
                continue;
            };
            let key = id.to_uppercase();
            if metadata.by_id.contains_key(&key) {
                warn!(document_id = %id, row = line + 1, "Duplicate scraper row, keeping the first");
                continue;
            }

            row.pdf_name = row.documents.as_deref().and_then(pdf_name_from_link);

            let index = metadata.rows.len();
            metadata.by_id.insert(key, index);
            if let Some(md5) = &row.md5sum {
                metadata.by_md5.entry(md5.to_lowercase()).or_insert(index);
            }
            if let Some(pdf_name) = &row.pdf_name {
                metadata.by_pdf_name.entry(pdf_name.clone()).or_insert(index);
            }
            metadata.rows.push(row);
        }

        Ok(metadata)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for a document id, compared case-insensitively.
    pub fn get(&self, document_id: &str) -> Option<&ScraperRow> {
        self.by_id
            .get(&document_id.to_uppercase())
            .map(|&i| &self.rows[i])
    }

    /// Row describing `document`.
    ///
    /// Tries the document id first, then the PDF checksum, then an exact
    /// match of the document name against the PDF name.
    pub fn find(&self, document: &ParsedDocument) -> Option<&ScraperRow> {
        if let Some(row) = self.get(&document.document_id) {
            return Some(row);
        }

        let md5 = document
            .document_md5_sum
            .as_deref()
            .or_else(|| document.pdf_data.as_ref().and_then(|p| p.md5sum.as_deref()));
        if let Some(&i) = md5.and_then(|m| self.by_md5.get(&m.to_lowercase())) {
            return Some(&self.rows[i]);
        }

        self.by_pdf_name
            .get(&document.document_name)
            .map(|&i| &self.rows[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
CPR Document ID,Title,Author,Author Type,Submission Type,Date,Documents,Document Variant,Party
UNFCCC.party.1.0,Submission by Brazil,Brazil,Party,Submission,2023-06-15,https://unfccc.int/sites/default/files/resource/BR%20submission.pdf,nan,Brazil
,Orphan row,Nobody,Non-Party,Submission,2022-01-01,https://example.org/orphan.pdf,,
unfccc.party.1.0,Duplicate,Brazil,Party,Submission,2023-06-16,https://example.org/dup.pdf,,
UNFCCC.non-party.2.0,Synthesis report,\"IPCC, WMO\",Non-Party,\"Report, Synthesis\",N/A,https://example.org/files/synthesis.pdf,Original,None
";

    fn load() -> ScraperMetadata {
        ScraperMetadata::from_reader(CSV.as_bytes(), "scraper.csv").unwrap()
    }

    #[test]
    fn test_rows_without_id_and_duplicates_are_skipped() {
        let metadata = load();
        assert_eq!(metadata.len(), 2);
        assert_eq!(
            metadata.get("UNFCCC.PARTY.1.0").and_then(|r| r.title.as_deref()),
            Some("Submission by Brazil")
        );
    }

    #[test]
    fn test_null_like_cells_become_none() {
        let metadata = load();
        let brazil = metadata.get("UNFCCC.party.1.0").unwrap();
        assert_eq!(brazil.document_variant, None);

        let synthesis = metadata.get("UNFCCC.non-party.2.0").unwrap();
        assert_eq!(synthesis.date, None);
        assert_eq!(synthesis.party, None);
        assert_eq!(synthesis.author.as_deref(), Some("IPCC, WMO"));
        assert_eq!(synthesis.topics, None);
    }

    #[test]
    fn test_pdf_name_is_derived() {
        let metadata = load();
        let brazil = metadata.get("UNFCCC.party.1.0").unwrap();
        assert_eq!(brazil.pdf_name.as_deref(), Some("BR20submission"));
    }

    #[test]
    fn test_pdf_name_from_link() {
        assert_eq!(
            pdf_name_from_link("https://example.org/a/b/report%202023.pdf"),
            Some("report202023".to_string())
        );
        assert_eq!(pdf_name_from_link("https://example.org/"), Some("example.org".to_string()));
        assert_eq!(pdf_name_from_link(""), None);
    }

    #[test]
    fn test_find_falls_back_to_pdf_name() {
        let metadata = load();
        let document: ParsedDocument = serde_json::from_value(serde_json::json!({
            "document_id": "CCLW.gst.7.7",
            "document_name": "synthesis"
        }))
        .unwrap();

        let row = metadata.find(&document).unwrap();
        assert_eq!(row.document_id.as_deref(), Some("UNFCCC.non-party.2.0"));
    }

    #[test]
    fn test_find_returns_none_without_match() {
        let metadata = load();
        let document: ParsedDocument = serde_json::from_value(serde_json::json!({
            "document_id": "CCLW.gst.8.8",
            "document_name": "unknown"
        }))
        .unwrap();

        assert!(metadata.find(&document).is_none());
    }
}
