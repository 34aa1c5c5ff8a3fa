//! Concept selection and passage classification.

use std::collections::{BTreeMap, BTreeSet};

use gst_indexer_shared::PassageKind;

use crate::IndexingError;

/// Concepts that label whole text blocks.
const FULL_PASSAGE_CONCEPTS: &[&str] = &["policy-instruments", "sectors"];

/// Concepts that label a region within a text block.
const PARTIAL_PASSAGE_CONCEPTS: &[&str] = &[
    "adaptation",
    "barriers-and-challenges",
    "capacity-building",
    "climate-related-hazards",
    "deforestation",
    "equity-and-just-transition",
    "financial-flows",
    "fossil-fuels",
    "good-practice-and-opportunities",
    "greenhouse-gases",
    "international-cooperation",
    "loss-and-damage",
    "mitigation",
    "renewables",
    "response-measures",
    "technologies-br-adaptation-br",
    "technologies-br-mitigation-br",
    "vulnerable-groups",
];

/// Which concepts to index, and how each one annotates text.
///
/// Passed explicitly to the span loader so that runs (and tests) can use
/// different selections.
#[derive(Debug, Clone, Default)]
pub struct ConceptConfig {
    allow_list: BTreeSet<String>,
    classification: BTreeMap<String, PassageKind>,
}

impl ConceptConfig {
    pub fn new(
        allow_list: impl IntoIterator<Item = String>,
        classification: BTreeMap<String, PassageKind>,
    ) -> Self {
        Self {
            allow_list: allow_list.into_iter().collect(),
            classification,
        }
    }

    /// Select `allow_list` using the built-in classification of known concepts.
    pub fn with_default_classification(allow_list: impl IntoIterator<Item = String>) -> Self {
        Self::new(allow_list, default_classification())
    }

    pub fn is_selected(&self, concept_id: &str) -> bool {
        self.allow_list.contains(concept_id)
    }

    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.allow_list.iter().map(String::as_str)
    }

    pub fn passage_kind(&self, concept_id: &str) -> Option<PassageKind> {
        self.classification.get(concept_id).copied()
    }

    /// Check that every selected concept is classified.
    pub fn validate(&self) -> Result<(), IndexingError> {
        match self
            .allow_list
            .iter()
            .find(|c| !self.classification.contains_key(c.as_str()))
        {
            Some(concept) => Err(IndexingError::ConceptNotClassified(concept.clone())),
            None => Ok(()),
        }
    }
}

/// The built-in classification of known concepts.
pub fn default_classification() -> BTreeMap<String, PassageKind> {
    FULL_PASSAGE_CONCEPTS
        .iter()
        .map(|c| (c.to_string(), PassageKind::FullPassage))
        .chain(
            PARTIAL_PASSAGE_CONCEPTS
                .iter()
                .map(|c| (c.to_string(), PassageKind::PartialPassage)),
        )
        .collect()
}
