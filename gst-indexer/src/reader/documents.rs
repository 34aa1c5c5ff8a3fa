//! Parsed document reader.
//!
//! The document parser writes one JSON file per document into a directory.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use gst_indexer_shared::ParsedDocument;
use tracing::{debug, info};

use crate::errors::IngestError;

/// Documents read from the parser output directory.
#[derive(Debug, Default)]
pub struct LoadedDocuments {
    pub documents: Vec<ParsedDocument>,
    /// Documents dropped because the parser tagged them with other languages only.
    pub skipped_non_english: usize,
}

/// JSON files directly inside `dir`, sorted by file name.
fn json_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| IngestError::io(dir, e))? {
        let path = entry.map_err(|e| IngestError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read one parsed document.
pub fn read_document(path: &Path) -> Result<ParsedDocument, IngestError> {
    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| IngestError::json(path.display().to_string(), e))
}

/// Read the parsed documents in `dir` in file-name order.
///
/// `limit` caps the number of files read. Documents with a language tag
/// that does not include English are dropped; untagged documents, including
/// those with an empty language list, are kept.
pub fn load_parsed_documents(
    dir: impl AsRef<Path>,
    limit: Option<usize>,
) -> Result<LoadedDocuments, IngestError> {
    let dir = dir.as_ref();
    let mut files = json_files(dir)?;
    if let Some(limit) = limit {
        files.truncate(limit);
    }

    let mut loaded = LoadedDocuments::default();
    for path in &files {
        let document = read_document(path)?;
        let tagged = document.languages.as_ref().is_some_and(|l| !l.is_empty());
        if tagged && !document.is_english() {
            debug!(document_id = %document.document_id, "Skipping non-English document");
            loaded.skipped_non_english += 1;
            continue;
        }
        loaded.documents.push(document);
    }

    info!(
        dir = %dir.display(),
        files = files.len(),
        documents = loaded.documents.len(),
        skipped_non_english = loaded.skipped_non_english,
        "Loaded parsed documents"
    );
    Ok(loaded)
}
