//! Dependency initialization and wiring for the GST indexer.

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{ConceptConfig, ConnectionMode, IndexerConfig};
use crate::loader::SearchLoader;
use crate::orchestrator::{Orchestrator, RunOptions};
use crate::IndexingError;
use gst_indexer_repository::{OpenSearchProvider, SearchIndexService, SearchIndexServiceConfig};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`IndexerConfig::from_env`] for the variables read. On a dry run
    /// no connection to OpenSearch is made.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If the configuration is invalid or OpenSearch
    ///   cannot be reached
    pub async fn new(options: RunOptions) -> Result<Self, IndexingError> {
        let config = IndexerConfig::from_env()?;
        Self::from_config(config, options).await
    }

    /// Initialize dependencies from an already loaded configuration.
    pub async fn from_config(
        config: IndexerConfig,
        options: RunOptions,
    ) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %config.opensearch_url,
            connection_mode = ?config.connection_mode,
            concepts = ?config.concepts_to_index,
            bulk_chunk_size = config.bulk_chunk_size,
            dry_run = options.dry_run,
            "Initializing dependencies"
        );

        let concepts = ConceptConfig::with_default_classification(config.concepts_to_index.clone());
        concepts.validate()?;

        let loader = if options.dry_run {
            None
        } else {
            let loader = Self::create_loader(&config)?;
            Self::connect(&loader, &config).await?;
            info!("OpenSearch connection established");
            Some(loader)
        };

        Ok(Self {
            orchestrator: Orchestrator::new(options, concepts, loader),
        })
    }

    fn create_loader(config: &IndexerConfig) -> Result<SearchLoader, IndexingError> {
        let provider = OpenSearchProvider::new(&config.opensearch_url, config.auth.clone())
            .map_err(|e| {
                IndexingError::config(format!("Failed to create OpenSearch provider: {}", e))
            })?;
        let service_config =
            SearchIndexServiceConfig::new(config.bulk_chunk_size, config.bulk_max_retries)?;
        let service = SearchIndexService::with_config(Box::new(provider), service_config);
        Ok(SearchLoader::new(service))
    }

    /// Ping OpenSearch, retrying according to the connection mode.
    async fn connect(loader: &SearchLoader, config: &IndexerConfig) -> Result<(), IndexingError> {
        let attempts = match config.connection_mode {
            ConnectionMode::FailFast => 1,
            ConnectionMode::Retry => config.connect_attempts,
        };

        let mut attempt = 1;
        loop {
            match loader.check_ready().await {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= attempts => {
                    return Err(IndexingError::config(format!(
                        "Failed to connect to OpenSearch after {} attempt(s): {}",
                        attempt, e
                    )));
                }
                Err(e) => {
                    warn!(
                        opensearch_url = %config.opensearch_url,
                        error = %e,
                        attempt = attempt,
                        retry_interval_secs = config.retry_interval.as_secs(),
                        "Failed to connect to OpenSearch, retrying..."
                    );
                    sleep(config.retry_interval).await;
                    attempt += 1;
                }
            }
        }
    }
}
