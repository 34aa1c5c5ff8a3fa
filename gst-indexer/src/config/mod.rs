//! Configuration and dependency initialization for the GST indexer.

pub mod concepts;
mod dependencies;
mod settings;

pub use concepts::ConceptConfig;
pub use dependencies::Dependencies;
pub use settings::{ConnectionMode, IndexerConfig};
