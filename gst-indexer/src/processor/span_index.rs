//! Mapping from text blocks to the spans attached to them.

use std::collections::{HashMap, HashSet};

use gst_indexer_shared::{MergedDocument, Span};
use tracing::{info, warn};

use crate::errors::IngestError;

/// What to do with a span whose document or text block is not in the corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpanPolicy {
    /// Drop the span, count it and log a warning.
    #[default]
    Warn,
    /// Fail on the first such span.
    Strict,
}

/// Spans grouped by uppercased document id, then text block id.
///
/// Built once after spans are loaded and documents merged; text blocks are
/// never modified.
#[derive(Debug, Default)]
pub struct SpanIndex {
    blocks: HashMap<String, HashMap<String, Vec<Span>>>,
    attached: usize,
    dropped: usize,
    duplicates: usize,
}

impl SpanIndex {
    /// Attach `spans` to the blocks of `corpus`.
    ///
    /// Spans repeating an already attached `(document, block, type, id)` are
    /// ignored.
    pub fn build(
        spans: Vec<Span>,
        corpus: &[MergedDocument],
        policy: SpanPolicy,
    ) -> Result<Self, IngestError> {
        let known: HashMap<String, HashSet<&str>> = corpus
            .iter()
            .map(|doc| {
                (
                    doc.document_id().to_uppercase(),
                    doc.text_blocks()
                        .iter()
                        .map(|b| b.text_block_id.as_str())
                        .collect(),
                )
            })
            .collect();

        let mut index = Self::default();
        let mut seen: HashSet<(String, String, String, String)> = HashSet::new();

        for span in spans {
            let document_id = span.document_id.to_uppercase();

            let Some(blocks) = known.get(&document_id) else {
                if policy == SpanPolicy::Strict {
                    return Err(IngestError::UnknownDocument {
                        document_id,
                        span_id: span.id,
                    });
                }
                index.dropped += 1;
                continue;
            };

            if !blocks.contains(span.text_block_id.as_str()) {
                if policy == SpanPolicy::Strict {
                    return Err(IngestError::UnknownTextBlock {
                        document_id,
                        text_block_id: span.text_block_id,
                        span_id: span.id,
                    });
                }
                index.dropped += 1;
                continue;
            }

            let key = (
                document_id.clone(),
                span.text_block_id.clone(),
                span.span_type.clone(),
                span.id.clone(),
            );
            if !seen.insert(key) {
                index.duplicates += 1;
                continue;
            }

            index
                .blocks
                .entry(document_id)
                .or_default()
                .entry(span.text_block_id.clone())
                .or_default()
                .push(span);
            index.attached += 1;
        }

        if index.dropped > 0 {
            warn!(
                dropped = index.dropped,
                "Dropped spans referring to documents or text blocks outside the corpus"
            );
        }
        info!(
            attached = index.attached,
            duplicates = index.duplicates,
            "Built span index"
        );
        Ok(index)
    }

    /// Spans attached to a text block, in load order.
    pub fn spans_for(&self, document_id: &str, text_block_id: &str) -> &[Span] {
        self.blocks
            .get(&document_id.to_uppercase())
            .and_then(|blocks| blocks.get(text_block_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn attached(&self) -> usize {
        self.attached
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
