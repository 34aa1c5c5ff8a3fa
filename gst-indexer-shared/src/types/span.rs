//! Concept span types.
//!
//! A span is a label produced by concept extraction and attached to a single
//! text block. Span types are namespaced by their concept so that labels from
//! different concepts never collide: `"<Concept> – <Subtype>"`.

use serde::{Deserialize, Serialize};

/// Separator between a concept's display name and a subtype in span labels.
pub const LABEL_SEPARATOR: &str = " – ";

/// Build the namespaced label for a subtype of a concept.
pub fn concept_label(concept_name: &str, subtype: &str) -> String {
    format!("{}{}{}", concept_name, LABEL_SEPARATOR, subtype)
}

/// Build the wildcard label matching every subtype of a concept.
pub fn wildcard_label(concept_name: &str) -> String {
    concept_label(concept_name, "All")
}

/// Whether a concept annotates whole text blocks or a region within them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PassageKind {
    /// The label applies to the entire text block.
    FullPassage,
    /// The label applies to a character range within the text block.
    PartialPassage,
}

impl PassageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassageKind::FullPassage => "full_passage",
            PassageKind::PartialPassage => "partial_passage",
        }
    }
}

/// A relabeled concept span attached to one text block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Span {
    /// Uppercased identifier of the document the span belongs to.
    pub document_id: String,
    pub text_block_id: String,
    /// Namespaced label, e.g. `Fossil Fuels – Coal`.
    #[serde(rename = "type")]
    pub span_type: String,
    pub id: String,
    /// Character offset where the span starts within the block text.
    pub start_idx: Option<usize>,
    /// Character offset one past the span's last character.
    pub end_idx: Option<usize>,
    /// Records whether the span's concept is full or partial passage.
    pub annotator: PassageKind,
    /// Directory name of the concept, e.g. `fossil-fuels`.
    pub concept_id: String,
    /// Display name of the concept, e.g. `Fossil Fuels`.
    pub concept_name: String,
    /// Hash of the block text the span was extracted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_block_text_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pred_probability: Option<f64>,
}

impl Span {
    pub fn is_full_passage(&self) -> bool {
        self.annotator == PassageKind::FullPassage
    }

    /// The wildcard label of this span's concept.
    pub fn wildcard_label(&self) -> String {
        wildcard_label(&self.concept_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(concept_label("Fossil Fuels", "Coal"), "Fossil Fuels – Coal");
        assert_eq!(wildcard_label("Fossil Fuels"), "Fossil Fuels – All");
    }

    #[test]
    fn test_passage_kind_serialization() {
        assert_eq!(
            serde_json::to_value(PassageKind::FullPassage).unwrap(),
            "full_passage"
        );
        assert_eq!(PassageKind::PartialPassage.as_str(), "partial_passage");
    }
}
