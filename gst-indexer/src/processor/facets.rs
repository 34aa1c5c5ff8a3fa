//! Corpus-wide filter facets.

use std::collections::{BTreeMap, BTreeSet};

use gst_indexer_shared::{wildcard_label, FilterFacets, MergedDocument};
use tracing::debug;

/// Build the filter facets for `documents`.
///
/// Undated documents are left out of the date range but still contribute
/// their authors and types. `labels_by_concept` maps concept display names
/// to their span labels.
pub fn build_facets(
    documents: &[MergedDocument],
    labels_by_concept: &BTreeMap<String, Vec<String>>,
) -> FilterFacets {
    let mut authors = BTreeSet::new();
    let mut types = BTreeSet::new();
    let mut undated = 0;

    let dates: Vec<_> = documents
        .iter()
        .filter_map(|doc| {
            let metadata = &doc.document_metadata;
            authors.extend(metadata.author.iter().cloned());
            types.extend(metadata.types.iter().cloned());
            if metadata.date.is_none() {
                undated += 1;
            }
            metadata.date
        })
        .collect();

    if undated > 0 {
        debug!(undated = undated, "Documents without a date left out of the date range");
    }

    let concepts = labels_by_concept
        .iter()
        .map(|(concept, labels)| {
            let sorted: BTreeSet<&String> = labels.iter().collect();
            let values = std::iter::once(wildcard_label(concept))
                .chain(sorted.into_iter().cloned())
                .collect();
            (concept.clone(), values)
        })
        .collect();

    FilterFacets {
        date_min: dates.iter().min().map(|d| d.format("%Y-%m-%d").to_string()),
        date_max: dates.iter().max().map(|d| d.format("%Y-%m-%d").to_string()),
        authors: authors.into_iter().collect(),
        types: types.into_iter().collect(),
        concepts,
    }
}
