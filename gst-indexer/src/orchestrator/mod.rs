//! Orchestrator module for the GST indexer.
//!
//! Runs the reader, processor and loader stages of one indexing run in order.

use std::path::PathBuf;

use chrono::Utc;
use gst_indexer_shared::{FilterFacets, MergedDocument, SearchRecord};
use tracing::{info, instrument, warn};

use crate::config::ConceptConfig;
use crate::errors::IngestError;
use crate::loader::{BulkLoadReport, IndexNames, SearchLoader};
use crate::processor::{build_facets, flatten_corpus, merge_corpus, SpanIndex, SpanPolicy};
use crate::reader::{load_concept_spans, load_parsed_documents, ScraperMetadata};
use crate::IndexingError;

/// Default index name prefix.
pub const DEFAULT_INDEX_PREFIX: &str = "global-stocktake";

/// Options for one indexing run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub parser_outputs_dir: PathBuf,
    pub scraper_csv_path: PathBuf,
    pub concepts_dir: PathBuf,
    pub index_prefix: String,
    /// Alias to move onto the new index. Defaults to `<index_prefix>-docs`.
    pub alias: Option<String>,
    /// Maximum number of parsed documents to read.
    pub limit: Option<usize>,
    pub span_policy: SpanPolicy,
    pub update_aliases: bool,
    pub dry_run: bool,
}

impl RunOptions {
    /// Options with defaults for everything but the input paths.
    pub fn new(
        parser_outputs_dir: impl Into<PathBuf>,
        scraper_csv_path: impl Into<PathBuf>,
        concepts_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            parser_outputs_dir: parser_outputs_dir.into(),
            scraper_csv_path: scraper_csv_path.into(),
            concepts_dir: concepts_dir.into(),
            index_prefix: DEFAULT_INDEX_PREFIX.to_string(),
            alias: None,
            limit: None,
            span_policy: SpanPolicy::default(),
            update_aliases: true,
            dry_run: false,
        }
    }

    pub fn alias(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| format!("{}-docs", self.index_prefix))
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub documents_read: usize,
    pub skipped_non_english: usize,
    pub skipped_missing_metadata: usize,
    pub skipped_invalid_date: usize,
    pub documents_merged: usize,
    pub spans_attached: usize,
    pub spans_dropped: usize,
    pub records: usize,
    pub records_indexed: usize,
    pub records_failed: usize,
    /// Indices written, `None` on a dry run.
    pub index: Option<IndexNames>,
    pub aliases_updated: bool,
}

/// Everything computed before the first write to the search index.
#[derive(Debug)]
pub struct PreparedRun {
    pub documents: Vec<MergedDocument>,
    pub records: Vec<SearchRecord>,
    pub facets: FilterFacets,
    pub summary: RunSummary,
}

/// Orchestrator that coordinates the indexing stages.
pub struct Orchestrator {
    options: RunOptions,
    concepts: ConceptConfig,
    /// `None` runs without contacting the search index.
    loader: Option<SearchLoader>,
}

impl Orchestrator {
    /// Create a new orchestrator. Pass no loader for a dry run.
    pub fn new(options: RunOptions, concepts: ConceptConfig, loader: Option<SearchLoader>) -> Self {
        Self {
            options,
            concepts,
            loader,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Read the inputs and build the search records and facets.
    #[instrument(skip(self), fields(parser_outputs_dir = %self.options.parser_outputs_dir.display()))]
    pub fn prepare(&self) -> Result<PreparedRun, IndexingError> {
        let metadata = ScraperMetadata::from_path(&self.options.scraper_csv_path)?;
        let loaded = load_parsed_documents(&self.options.parser_outputs_dir, self.options.limit)?;
        let documents_read = loaded.documents.len() + loaded.skipped_non_english;

        let merged = merge_corpus(&loaded.documents, &metadata)?;
        let concept_spans = load_concept_spans(&self.options.concepts_dir, &self.concepts)?;
        let span_index = SpanIndex::build(
            concept_spans.spans,
            &merged.documents,
            self.options.span_policy,
        )?;

        let records = flatten_corpus(&merged.documents, &span_index);
        let facets = build_facets(&merged.documents, &concept_spans.labels_by_concept);

        let summary = RunSummary {
            documents_read,
            skipped_non_english: loaded.skipped_non_english,
            skipped_missing_metadata: merged.skipped_missing_metadata,
            skipped_invalid_date: merged.skipped_invalid_date,
            documents_merged: merged.documents.len(),
            spans_attached: span_index.attached(),
            spans_dropped: span_index.dropped(),
            records: records.len(),
            ..Default::default()
        };

        info!(
            documents = summary.documents_merged,
            records = summary.records,
            concepts = facets.concepts.len(),
            "Prepared search records"
        );

        Ok(PreparedRun {
            documents: merged.documents,
            records,
            facets,
            summary,
        })
    }

    /// Run the whole pipeline.
    ///
    /// Nothing is written to the search index until every input has been
    /// read and every record built.
    #[instrument(skip(self), fields(index_prefix = %self.options.index_prefix))]
    pub async fn run(&self) -> Result<RunSummary, IndexingError> {
        let prepared = self.prepare()?;
        let mut summary = prepared.summary;

        let Some(loader) = &self.loader else {
            info!(
                records = summary.records,
                "Dry run, nothing written to the search index"
            );
            return Ok(summary);
        };

        let names = IndexNames::timestamped(&self.options.index_prefix, Utc::now());
        loader.create_indices(&names).await?;

        let report = loader.load_records(&names.index, &prepared.records).await?;
        summary.records_indexed = report.succeeded;
        summary.records_failed = report.failed;
        Self::check_report(&report, &names)?;

        loader
            .write_facets(&names.metadata_index, &prepared.facets)
            .await?;

        if self.options.update_aliases {
            loader.swap_aliases(&names, &self.options.alias()).await?;
            summary.aliases_updated = true;
        } else {
            info!(index = %names.index, "Leaving aliases unchanged");
        }

        summary.index = Some(names);
        Ok(summary)
    }

    /// An index without a single record is never put behind the alias.
    fn check_report(report: &BulkLoadReport, names: &IndexNames) -> Result<(), IngestError> {
        if report.total > 0 && report.succeeded == 0 {
            return Err(IngestError::loader(format!(
                "none of {} records were indexed into {}",
                report.total, names.index
            )));
        }
        if report.failed > 0 {
            warn!(
                failed = report.failed,
                index = %names.index,
                "Some records were not indexed"
            );
        }
        Ok(())
    }
}
