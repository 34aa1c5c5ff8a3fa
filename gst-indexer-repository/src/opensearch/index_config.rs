//! OpenSearch index naming, settings and mappings.
//!
//! Every run writes into freshly created, timestamped indices. Aliases are
//! moved onto them once loading completes so that readers never observe a
//! partially loaded index.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::types::AliasAction;

/// Suffix appended to an index name to form its companion metadata index.
pub const METADATA_INDEX_SUFFIX: &str = "-metadata";

/// Top-level fields analysed as free text.
const SEARCHABLE_FIELDS: &[&str] = &["text", "text_before", "text_after"];

/// Fields holding HTML, analysed with tags stripped.
const HTML_FIELDS: &[&str] = &["text_html"];

/// Top-level exact-match fields.
const KEYWORD_FIELDS: &[&str] = &[
    "id",
    "type",
    "document_id",
    "text_block_id",
    "span_ids",
    "span_types",
    "span_types_full_passage",
];

/// Exact-match fields under `document_metadata`.
const METADATA_KEYWORD_FIELDS: &[&str] = &[
    "author",
    "type",
    "link",
    "party",
    "theme",
    "topics",
    "translation",
    "data_error_type",
];

/// Name for a new index created at `now`: `<prefix>-<YYYYMMDD-HHMMSS>`.
pub fn timestamped_index_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", prefix, now.format("%Y%m%d-%H%M%S"))
}

/// Name of the metadata index paired with `index`.
pub fn metadata_index_name(index: &str) -> String {
    format!("{}{}", index, METADATA_INDEX_SUFFIX)
}

/// Actions that move `alias` from `current` indices onto `new_index`.
///
/// `new_index` is never removed even if it is already among `current`.
pub fn alias_swap_actions(alias: &str, current: &[String], new_index: &str) -> Vec<AliasAction> {
    let mut actions: Vec<AliasAction> = current
        .iter()
        .filter(|index| index.as_str() != new_index)
        .map(|index| AliasAction::Remove {
            index: index.clone(),
            alias: alias.to_string(),
        })
        .collect();
    actions.push(AliasAction::Add {
        index: new_index.to_string(),
        alias: alias.to_string(),
    });
    actions
}

fn keyword_field() -> Value {
    json!({ "type": "keyword", "normalizer": "folding" })
}

/// Settings and mappings for the passage index.
///
/// The configuration includes:
/// - **folding** analyser: lowercases and folds non-ASCII characters while
///   keeping the original token, so "é" matches both "e" and "é"
/// - **ignore_html_tags** analyser: as `folding`, plus HTML stripping and
///   English stemming, used for `text_html`
/// - **folding** normaliser: the keyword-field counterpart of `folding`
pub fn get_index_settings() -> Value {
    let mut properties = Map::new();
    for field in SEARCHABLE_FIELDS {
        properties.insert(
            field.to_string(),
            json!({ "type": "text", "analyzer": "folding" }),
        );
    }
    for field in KEYWORD_FIELDS {
        properties.insert(field.to_string(), keyword_field());
    }
    for field in HTML_FIELDS {
        properties.insert(
            field.to_string(),
            json!({ "type": "text", "analyzer": "ignore_html_tags" }),
        );
    }

    let mut metadata_properties = Map::new();
    for field in METADATA_KEYWORD_FIELDS {
        metadata_properties.insert(field.to_string(), keyword_field());
    }
    metadata_properties.insert("author_is_party".to_string(), json!({ "type": "boolean" }));
    properties.insert(
        "document_metadata".to_string(),
        json!({ "properties": metadata_properties }),
    );

    properties.insert(
        "date_string".to_string(),
        json!({ "type": "date", "format": "yyyy-MM-dd" }),
    );
    properties.insert("is_party".to_string(), json!({ "type": "boolean" }));
    properties.insert("page_number".to_string(), json!({ "type": "integer" }));

    json!({
        "settings": {
            "index": { "number_of_shards": 1 },
            "analysis": {
                "filter": {
                    "ascii_folding_preserve_original": {
                        "type": "asciifolding",
                        "preserve_original": true
                    },
                    "filter_stemmer": { "type": "stemmer", "language": "english" }
                },
                "analyzer": {
                    "folding": {
                        "tokenizer": "standard",
                        "filter": ["lowercase", "ascii_folding_preserve_original"]
                    },
                    "ignore_html_tags": {
                        "tokenizer": "standard",
                        "filter": ["lowercase", "ascii_folding_preserve_original", "filter_stemmer"],
                        "char_filter": ["html_strip"]
                    }
                },
                "normalizer": {
                    "folding": {
                        "type": "custom",
                        "char_filter": [],
                        "filter": ["lowercase", "asciifolding"]
                    }
                }
            }
        },
        "mappings": { "properties": properties }
    })
}

/// Settings for the metadata index, which only holds the filter facets document.
pub fn get_metadata_index_settings() -> Value {
    json!({
        "settings": {
            "index": { "number_of_shards": 1 }
        },
        "mappings": {
            "dynamic": true
        }
    })
}
