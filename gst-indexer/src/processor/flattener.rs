//! Flattening of merged documents into search records.

use std::collections::BTreeSet;

use gst_indexer_shared::{MergedDocument, SearchRecord};

use crate::processor::html::highlight_html;
use crate::processor::span_index::SpanIndex;

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One search record per text block of `document`, in block order.
///
/// Each record carries the normalised text of its neighbours so a hit can be
/// shown in context; the first block has no text before and the last none
/// after.
pub fn flatten_document(document: &MergedDocument, spans: &SpanIndex) -> Vec<SearchRecord> {
    let blocks = document.text_blocks();
    let raw: Vec<String> = blocks.iter().map(|b| b.to_text()).collect();
    let texts: Vec<String> = raw.iter().map(|t| normalize_whitespace(t)).collect();

    let doc = &document.document;
    let metadata = &document.document_metadata;
    let date_string = metadata.date.map(|d| d.format("%Y-%m-%d").to_string());

    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let block_spans = spans.spans_for(&doc.document_id, &block.text_block_id);

            let mut span_types = BTreeSet::new();
            let mut span_types_full_passage = BTreeSet::new();
            let mut span_ids = BTreeSet::new();
            for span in block_spans {
                span_types.insert(span.span_type.clone());
                span_types.insert(span.wildcard_label());
                if span.is_full_passage() {
                    span_types_full_passage.insert(span.span_type.clone());
                    span_types_full_passage.insert(span.wildcard_label());
                }
                span_ids.insert(span.id.clone());
            }

            SearchRecord {
                document_id: doc.document_id.clone(),
                document_name: doc.document_name.clone(),
                document_description: doc.document_description.clone(),
                document_source_url: doc.document_source_url.clone(),
                document_md5_sum: doc.document_md5_sum.clone(),
                document_slug: doc.document_slug.clone(),
                languages: doc.languages.clone().unwrap_or_default(),
                translated: doc.translated,
                document_metadata: metadata.clone(),
                text_block_id: block.text_block_id.clone(),
                page_number: block.page_number,
                block_type: block.block_type.clone(),
                type_confidence: block.type_confidence,
                text_before: if i > 0 { texts[i - 1].clone() } else { String::new() },
                text: texts[i].clone(),
                text_after: texts.get(i + 1).cloned().unwrap_or_default(),
                text_html: highlight_html(&raw[i], block_spans),
                span_types: span_types.into_iter().collect(),
                span_types_full_passage: span_types_full_passage.into_iter().collect(),
                span_ids: span_ids.into_iter().collect(),
                is_party: metadata.author_is_party,
                date_string: date_string.clone(),
            }
        })
        .collect()
}

/// Flatten every document of the corpus, in corpus order.
pub fn flatten_corpus(documents: &[MergedDocument], spans: &SpanIndex) -> Vec<SearchRecord> {
    documents
        .iter()
        .flat_map(|d| flatten_document(d, spans))
        .collect()
}
