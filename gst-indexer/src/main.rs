//! GST Indexer Main Entry Point
//!
//! Builds the Global Stocktake search index from the parser outputs, the
//! scraper metadata CSV and the concept spans, and loads it into OpenSearch.

use std::env;
use std::path::PathBuf;

use clap::Parser;
use dotenv::dotenv;
use gst_indexer::orchestrator::{RunOptions, DEFAULT_INDEX_PREFIX};
use gst_indexer::processor::SpanPolicy;
use gst_indexer::{Dependencies, IndexingError};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Index parsed GST documents, their metadata and concept spans into OpenSearch.
#[derive(Parser, Debug)]
#[command(name = "gst-indexer", version, about)]
struct Cli {
    /// Directory of parsed document JSON files
    parser_outputs_dir: PathBuf,

    /// Scraper metadata CSV
    scraper_csv_path: PathBuf,

    /// Directory with one sub-directory of span CSVs per concept
    concepts_dir: PathBuf,

    /// Prefix of the index name
    #[arg(short, long, default_value = DEFAULT_INDEX_PREFIX)]
    index: String,

    /// Maximum number of parsed documents to read
    #[arg(short, long)]
    limit: Option<usize>,

    /// Alias moved onto the new index [default: <INDEX>-docs]
    #[arg(long)]
    alias: Option<String>,

    /// Fail on spans referring to unknown documents or text blocks
    #[arg(long)]
    strict_spans: bool,

    /// Build the indices without moving the aliases
    #[arg(long)]
    skip_alias_update: bool,

    /// Build the records without contacting OpenSearch
    #[arg(long)]
    dry_run: bool,
}

impl From<Cli> for RunOptions {
    fn from(cli: Cli) -> Self {
        Self {
            parser_outputs_dir: cli.parser_outputs_dir,
            scraper_csv_path: cli.scraper_csv_path,
            concepts_dir: cli.concepts_dir,
            index_prefix: cli.index,
            alias: cli.alias,
            limit: cli.limit,
            span_policy: if cli.strict_spans {
                SpanPolicy::Strict
            } else {
                SpanPolicy::Warn
            },
            update_aliases: !cli.skip_alias_update,
            dry_run: cli.dry_run,
        }
    }
}

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gst_indexer=info,gst_indexer_repository=info"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "gst-indexer",
        service_version = env!("CARGO_PKG_VERSION"),
        json = json,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    let cli = Cli::parse();

    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!("Starting GST indexer");

    let deps = match Dependencies::new(cli.into()).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.orchestrator.run().await {
        Ok(summary) => {
            info!(
                documents_read = summary.documents_read,
                skipped_non_english = summary.skipped_non_english,
                skipped_missing_metadata = summary.skipped_missing_metadata,
                skipped_invalid_date = summary.skipped_invalid_date,
                documents_merged = summary.documents_merged,
                spans_attached = summary.spans_attached,
                spans_dropped = summary.spans_dropped,
                records = summary.records,
                records_indexed = summary.records_indexed,
                records_failed = summary.records_failed,
                index = ?summary.index.as_ref().map(|n| n.index.as_str()),
                aliases_updated = summary.aliases_updated,
                "GST indexer completed successfully"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "GST indexer failed");
            Err(e)
        }
    }
}
