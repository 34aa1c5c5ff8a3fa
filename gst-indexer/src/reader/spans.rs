//! Concept span reader.
//!
//! The concepts directory holds one subdirectory per concept, named by the
//! concept id. Each contains one or more `spans*.csv` files (large concepts
//! are sharded as `spans_0.csv`, `spans_1.csv`, ...).

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use globset::{Glob, GlobMatcher};
use gst_indexer_shared::{concept_label, PassageKind, Span};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use crate::config::ConceptConfig;
use crate::errors::IngestError;
use crate::IndexingError;

/// File name pattern of span files within a concept directory.
const SPAN_FILE_PATTERN: &str = "spans*.csv";

/// One row of a span CSV as written by concept extraction.
#[derive(Debug, Deserialize)]
struct SpanRow {
    document_id: String,
    text_block_id: String,
    #[serde(rename = "type")]
    span_type: String,
    id: String,
    #[serde(default, deserialize_with = "optional_offset")]
    start_idx: Option<usize>,
    #[serde(default, deserialize_with = "optional_offset")]
    end_idx: Option<usize>,
    #[serde(default)]
    text_block_text_hash: Option<String>,
    #[serde(default)]
    sentence: Option<String>,
    #[serde(default)]
    pred_probability: Option<f64>,
}

/// Offsets may be written as floats (`12.0`) when the column has gaps.
fn optional_offset<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        let v = v.trim();
        v.parse::<usize>().ok().or_else(|| {
            v.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as usize)
        })
    }))
}

/// Spans of every selected concept, relabeled.
#[derive(Debug, Default)]
pub struct ConceptSpans {
    pub spans: Vec<Span>,
    /// Concept display name to its sorted, distinct span labels.
    pub labels_by_concept: BTreeMap<String, Vec<String>>,
}

/// Title-case `s` the way Python's `str.title` does: the first letter of
/// every run of letters is uppercased and the rest lowercased.
///
/// A letter whose uppercase form is several characters keeps only the first
/// one uppercased (`ß` becomes `Ss`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                let mut upper = c.to_uppercase();
                out.extend(upper.next());
                out.extend(upper.flat_map(char::to_lowercase));
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Normalise a subtype label: underscores become spaces, then title case.
///
/// Applying it to its own output changes nothing.
pub fn normalize_subtype(subtype: &str) -> String {
    title_case(&subtype.replace('_', " "))
}

/// Display name of a concept id.
///
/// Hyphens separate words, and a `-br-` ... `-br` pair encloses a
/// parenthesised qualifier: `technologies-br-adaptation-br` becomes
/// `Technologies (Adaptation)`.
pub fn concept_display_name(concept_id: &str) -> String {
    let mut name = concept_id.replace("-br-", " (");
    if let Some(stripped) = name.strip_suffix("-br") {
        name = format!("{})", stripped);
    }
    title_case(&name.replace('-', " "))
}

fn span_file_matcher() -> Result<GlobMatcher, IndexingError> {
    Glob::new(SPAN_FILE_PATTERN)
        .map(|g| g.compile_matcher())
        .map_err(|e| IndexingError::config(format!("invalid span file pattern: {}", e)))
}

/// Span files in a concept directory, sorted by name.
fn span_files(dir: &Path, matcher: &GlobMatcher) -> Result<Vec<PathBuf>, IngestError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| IngestError::io(dir, e))? {
        let path = entry.map_err(|e| IngestError::io(dir, e))?.path();
        let matches = path
            .file_name()
            .is_some_and(|name| matcher.is_match(Path::new(name)));
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_span_file(
    path: &Path,
    concept_id: &str,
    concept_name: &str,
    kind: PassageKind,
) -> Result<Vec<Span>, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| IngestError::csv(path, e))?;

    let mut spans = Vec::new();
    for result in reader.deserialize::<SpanRow>() {
        let row = result.map_err(|e| IngestError::csv(path, e))?;
        spans.push(Span {
            document_id: row.document_id.to_uppercase(),
            text_block_id: row.text_block_id,
            span_type: concept_label(concept_name, &normalize_subtype(&row.span_type)),
            id: row.id,
            start_idx: row.start_idx,
            end_idx: row.end_idx,
            annotator: kind,
            concept_id: concept_id.to_string(),
            concept_name: concept_name.to_string(),
            text_block_text_hash: row.text_block_text_hash,
            sentence: row.sentence,
            pred_probability: row.pred_probability,
        });
    }
    Ok(spans)
}

/// Load and relabel the spans of every selected concept under `concepts_dir`.
///
/// Fails with [`IndexingError::ConceptNotClassified`] before reading any
/// file if a selected concept has no classification.
pub fn load_concept_spans(
    concepts_dir: impl AsRef<Path>,
    config: &ConceptConfig,
) -> Result<ConceptSpans, IndexingError> {
    config.validate()?;

    let concepts_dir = concepts_dir.as_ref();
    let matcher = span_file_matcher()?;

    let mut dirs = Vec::new();
    for entry in fs::read_dir(concepts_dir).map_err(|e| IngestError::io(concepts_dir, e))? {
        let path = entry.map_err(|e| IngestError::io(concepts_dir, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut result = ConceptSpans::default();
    let mut seen = BTreeSet::new();

    for dir in dirs {
        let Some(concept_id) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if !config.is_selected(&concept_id) {
            info!(concept = %concept_id, "Skipping concept not selected for indexing");
            continue;
        }
        seen.insert(concept_id.clone());

        let kind = config
            .passage_kind(&concept_id)
            .ok_or_else(|| IndexingError::ConceptNotClassified(concept_id.clone()))?;

        let files = span_files(&dir, &matcher)?;
        if files.is_empty() {
            info!(concept = %concept_id, "No span files found, skipping concept");
            continue;
        }

        let concept_name = concept_display_name(&concept_id);
        let mut labels = BTreeSet::new();
        let mut count = 0;
        for file in &files {
            let spans = read_span_file(file, &concept_id, &concept_name, kind)?;
            debug!(file = %file.display(), spans = spans.len(), "Read span file");
            count += spans.len();
            labels.extend(spans.iter().map(|s| s.span_type.clone()));
            result.spans.extend(spans);
        }

        info!(
            concept = %concept_id,
            annotator = kind.as_str(),
            files = files.len(),
            spans = count,
            labels = labels.len(),
            "Loaded concept spans"
        );
        result
            .labels_by_concept
            .insert(concept_name, labels.into_iter().collect());
    }

    for missing in config.selected().filter(|c| !seen.contains(*c)) {
        warn!(concept = %missing, "Selected concept has no directory");
    }

    Ok(result)
}
