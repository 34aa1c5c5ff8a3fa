//! Filter facet types.
//!
//! The facets record is built once per run from the whole corpus and stored
//! as a single document in the metadata index, where the search front-end
//! reads it to populate its filter controls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Id of the facets document in the metadata index.
pub const FILTERS_DOCUMENT_ID: &str = "filters";

/// Corpus-wide distinct values used for search filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterFacets {
    /// Earliest document date, `YYYY-MM-DD`.
    pub date_min: Option<String>,
    /// Latest document date, `YYYY-MM-DD`.
    pub date_max: Option<String>,
    pub authors: Vec<String>,
    pub types: Vec<String>,
    /// Concept display name to `["<Concept> – All", <sorted labels>...]`.
    pub concepts: BTreeMap<String, Vec<String>>,
}
