//! OpenSearch implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using OpenSearch as the backend, along with the index settings and naming
//! rules used by the indexer.

mod index_config;
mod provider;

pub use index_config::{
    alias_swap_actions, get_index_settings, get_metadata_index_settings, metadata_index_name,
    timestamped_index_name, METADATA_INDEX_SUFFIX,
};
pub use provider::{BasicAuth, OpenSearchProvider};
