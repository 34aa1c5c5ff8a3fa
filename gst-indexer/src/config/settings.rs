//! Indexer settings read from the environment.

use std::env;
use std::time::Duration;

use gst_indexer_repository::BasicAuth;
use tracing::warn;

use crate::IndexingError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default number of connection attempts in retry mode.
const DEFAULT_CONNECT_ATTEMPTS: usize = 5;

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Default number of records per bulk request.
const DEFAULT_BULK_CHUNK_SIZE: usize = 500;

/// Default retry budget per bulk chunk.
const DEFAULT_BULK_MAX_RETRIES: usize = 5;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry the connection a bounded number of times.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to fail-fast if not set or invalid.
    fn parse(value: Option<String>) -> Self {
        match value {
            None => Self::FailFast,
            Some(v) => match v.to_lowercase().as_str() {
                "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
                "retry" => Self::Retry,
                _ => {
                    warn!(value = %v, "Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'fail-fast'");
                    Self::FailFast
                }
            },
        }
    }
}

/// Settings for a run, read from environment variables.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub opensearch_url: String,
    pub auth: Option<BasicAuth>,
    pub connection_mode: ConnectionMode,
    pub connect_attempts: usize,
    pub retry_interval: Duration,
    /// Concept ids to index. Empty when `CONCEPTS_TO_INDEX` is unset.
    pub concepts_to_index: Vec<String>,
    pub bulk_chunk_size: usize,
    pub bulk_max_retries: usize,
}

impl IndexerConfig {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`: basic auth, both or neither
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: fail-fast)
    /// - `OPENSEARCH_CONNECT_ATTEMPTS`: attempts in retry mode (default: 5)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: retry interval in seconds (default: 15)
    /// - `CONCEPTS_TO_INDEX`: comma-separated concept ids (default: none)
    /// - `BULK_CHUNK_SIZE`: records per bulk request (default: 500)
    /// - `BULK_MAX_RETRIES`: retry budget per chunk (default: 5)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let auth = match (non_empty("OPENSEARCH_USERNAME"), non_empty("OPENSEARCH_PASSWORD")) {
            (Some(username), Some(password)) => Some(BasicAuth { username, password }),
            (None, None) => None,
            _ => {
                return Err(IndexingError::config(
                    "OPENSEARCH_USERNAME and OPENSEARCH_PASSWORD must be set together",
                ))
            }
        };

        let concepts_to_index = non_empty("CONCEPTS_TO_INDEX")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let bulk_chunk_size = parse_number(&non_empty, "BULK_CHUNK_SIZE", DEFAULT_BULK_CHUNK_SIZE)?;
        if bulk_chunk_size == 0 {
            return Err(IndexingError::config("BULK_CHUNK_SIZE must be greater than zero"));
        }

        Ok(Self {
            opensearch_url: non_empty("OPENSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            auth,
            connection_mode: ConnectionMode::parse(non_empty("OPENSEARCH_CONNECTION_MODE")),
            connect_attempts: parse_number(
                &non_empty,
                "OPENSEARCH_CONNECT_ATTEMPTS",
                DEFAULT_CONNECT_ATTEMPTS,
            )?
            .max(1),
            retry_interval: Duration::from_secs(parse_number(
                &non_empty,
                "OPENSEARCH_RETRY_INTERVAL_SECS",
                DEFAULT_RETRY_INTERVAL_SECS,
            )?),
            concepts_to_index,
            bulk_chunk_size,
            bulk_max_retries: parse_number(&non_empty, "BULK_MAX_RETRIES", DEFAULT_BULK_MAX_RETRIES)?,
        })
    }
}

fn parse_number<T, F>(lookup: &F, key: &str, default: T) -> Result<T, IndexingError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| IndexingError::config(format!("{} must be a number, got {:?}", key, v))),
    }
}
