//! Configuration types for the SearchIndexService.

use std::time::Duration;

use crate::errors::SearchIndexError;

/// Configuration for the SearchIndexService.
///
/// Controls how bulk loads are split into requests and how failed items are
/// retried.
#[derive(Debug, Clone)]
pub struct SearchIndexServiceConfig {
    /// Number of documents sent in a single bulk request. Defaults to 500.
    pub chunk_size: usize,
    /// Number of times the retryable failures of a chunk are sent again. Defaults to 5.
    pub max_retries: usize,
    /// Delay before the first retry; doubled on every further retry. Defaults to 2s.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between retries. Defaults to 600s.
    pub max_backoff: Duration,
}

impl Default for SearchIndexServiceConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            max_retries: 5,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(600),
        }
    }
}

impl SearchIndexServiceConfig {
    /// Create a config with a custom chunk size and retry budget.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - Documents per bulk request, must be greater than zero
    /// * `max_retries` - Retry budget per chunk
    ///
    /// # Returns
    ///
    /// * `Ok(SearchIndexServiceConfig)` - With default backoff settings
    /// * `Err(SearchIndexError::ValidationError)` - If `chunk_size` is zero
    pub fn new(chunk_size: usize, max_retries: usize) -> Result<Self, SearchIndexError> {
        if chunk_size == 0 {
            return Err(SearchIndexError::validation(
                "chunk_size must be greater than zero",
            ));
        }
        Ok(Self {
            chunk_size,
            max_retries,
            ..Self::default()
        })
    }

    /// Replace the backoff delays.
    pub fn with_backoff(mut self, initial_backoff: Duration, max_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self.max_backoff = max_backoff;
        self
    }
}
