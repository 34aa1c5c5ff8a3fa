//! Metadata merger.
//!
//! Attaches the scraper row describing each parsed document, remapping the
//! CSV columns into [`DocumentMetadata`].

use chrono::{DateTime, NaiveDate};
use gst_indexer_shared::{DocumentMetadata, MergedDocument, ParsedDocument};
use tracing::{info, warn};

use crate::errors::IngestError;
use crate::reader::{ScraperMetadata, ScraperRow};

/// Split a comma-separated cell into trimmed, non-empty values.
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a scraper date: RFC 3339, `YYYY-MM-DD` or `DD/MM/YYYY`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(value, "%d/%m/%Y").ok())
}

/// Build document metadata from a scraper row.
pub fn metadata_from_row(
    document_id: &str,
    row: &ScraperRow,
) -> Result<DocumentMetadata, IngestError> {
    let date = match row.date.as_deref() {
        None => None,
        Some(value) => Some(parse_date(value).ok_or_else(|| IngestError::InvalidDate {
            document_id: document_id.to_string(),
            value: value.to_string(),
        })?),
    };

    Ok(DocumentMetadata {
        author: split_list(row.author.as_deref()),
        author_is_party: row
            .author_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("party")),
        types: split_list(row.submission_type.as_deref()),
        date,
        link: row.documents.clone(),
        document_variant: row.document_variant.clone(),
        geography_iso: row.geography_iso.clone(),
        party: row.party.clone(),
        theme: row.theme.clone(),
        topics: split_list(row.topics.as_deref()),
        language: row.language.clone(),
        translation: row.translation.clone(),
        data_error_type: row.data_error_type.clone(),
        source: row.source.clone(),
    })
}

/// Attach scraper metadata to one document.
///
/// # Returns
///
/// * `Ok(MergedDocument)` - With `document_name` replaced by the scraper title when present
/// * `Err(IngestError::MissingMetadata)` - If no scraper row describes the document
/// * `Err(IngestError::InvalidDate)` - If the row's date cannot be parsed
pub fn merge_metadata(
    document: &ParsedDocument,
    metadata: &ScraperMetadata,
) -> Result<MergedDocument, IngestError> {
    let row = metadata
        .find(document)
        .ok_or_else(|| IngestError::MissingMetadata {
            document_id: document.document_id.clone(),
        })?;

    let document_metadata = metadata_from_row(&document.document_id, row)?;

    let mut document = document.clone();
    if let Some(title) = &row.title {
        document.document_name = title.clone();
    }

    Ok(MergedDocument {
        document,
        document_metadata,
    })
}

/// Documents that merged, and counts of those that did not.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub documents: Vec<MergedDocument>,
    pub skipped_missing_metadata: usize,
    pub skipped_invalid_date: usize,
}

impl MergeOutcome {
    pub fn skipped(&self) -> usize {
        self.skipped_missing_metadata + self.skipped_invalid_date
    }
}

/// Merge every document, skipping those with per-document errors.
pub fn merge_corpus(
    documents: &[ParsedDocument],
    metadata: &ScraperMetadata,
) -> Result<MergeOutcome, IngestError> {
    let mut outcome = MergeOutcome::default();

    for document in documents {
        match merge_metadata(document, metadata) {
            Ok(merged) => outcome.documents.push(merged),
            Err(e) if e.is_per_document() => {
                warn!(document_id = %document.document_id, error = %e, "Skipping document");
                match e {
                    IngestError::InvalidDate { .. } => outcome.skipped_invalid_date += 1,
                    _ => outcome.skipped_missing_metadata += 1,
                }
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        merged = outcome.documents.len(),
        skipped_missing_metadata = outcome.skipped_missing_metadata,
        skipped_invalid_date = outcome.skipped_invalid_date,
        "Merged scraper metadata"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CSV: &str = "\
CPR Document ID,Title,Author,Author Type,Submission Type,Date,Documents,Topics
UNFCCC.party.1.0,Submission by Brazil,\"Brazil, Argentina\",Party,\"Submission, Technical paper\",2023-06-15,https://example.org/brazil.pdf,\"mitigation,  ,adaptation\"
UNFCCC.non-party.2.0,IPCC report,IPCC,Non-Party,Report,15/06/2021,https://example.org/ipcc.pdf,
UNFCCC.non-party.3.0,Bad date,WMO,Non-Party,Report,sometime in 2022,https://example.org/wmo.pdf,
UNFCCC.non-party.4.0,Undated,WMO,Non-Party,Report,,https://example.org/undated.pdf,
";

    fn metadata() -> ScraperMetadata {
        ScraperMetadata::from_reader(CSV.as_bytes(), "scraper.csv").unwrap()
    }

    fn document(id: &str, name: &str) -> ParsedDocument {
        serde_json::from_value(json!({ "document_id": id, "document_name": name })).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 6, 15);
        assert_eq!(parse_date("2023-06-15"), expected);
        assert_eq!(parse_date("15/06/2023"), expected);
        assert_eq!(parse_date("2023-06-15T10:30:00+02:00"), expected);
        assert_eq!(parse_date("June 2023"), None);
    }

    #[test]
    fn test_merge_remaps_columns() {
        let merged = merge_metadata(&document("unfccc.party.1.0", "brazil"), &metadata()).unwrap();
        let m = &merged.document_metadata;

        assert_eq!(merged.document.document_name, "Submission by Brazil");
        assert_eq!(m.author, vec!["Brazil", "Argentina"]);
        assert!(m.author_is_party);
        assert_eq!(m.types, vec!["Submission", "Technical paper"]);
        assert_eq!(m.topics, vec!["mitigation", "adaptation"]);
        assert_eq!(m.date, NaiveDate::from_ymd_opt(2023, 6, 15));
        assert_eq!(m.link.as_deref(), Some("https://example.org/brazil.pdf"));
    }

    #[test]
    fn test_merge_missing_metadata() {
        let result = merge_metadata(&document("CCLW.gst.9.9", "unknown"), &metadata());
        assert!(matches!(result, Err(IngestError::MissingMetadata { .. })));
    }

    #[test]
    fn test_merge_invalid_date() {
        let result = merge_metadata(&document("UNFCCC.non-party.3.0", "wmo"), &metadata());
        assert!(matches!(result, Err(IngestError::InvalidDate { ref value, .. }) if value == "sometime in 2022"));
    }

    #[test]
    fn test_merge_corpus_skips_and_counts() {
        let documents = vec![
            document("UNFCCC.party.1.0", "brazil"),
            document("UNFCCC.non-party.2.0", "ipcc"),
            document("UNFCCC.non-party.3.0", "wmo"),
            document("UNFCCC.non-party.4.0", "undated"),
            document("CCLW.gst.9.9", "unknown"),
        ];

        let outcome = merge_corpus(&documents, &metadata()).unwrap();

        assert_eq!(outcome.documents.len(), 3);
        assert_eq!(outcome.skipped_missing_metadata, 1);
        assert_eq!(outcome.skipped_invalid_date, 1);
        assert_eq!(outcome.skipped(), 2);
        assert!(!outcome.documents[1].document_metadata.author_is_party);
        assert_eq!(outcome.documents[2].document_metadata.date, None);
    }
}
