use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument};

use crate::config::Config;
use crate::domain::{MergedListing, Source};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::ingestion::load_delimited;
use crate::pipeline::processing::merge::{merge_sources, MergeReport, COALESCE_POLICY};
use crate::pipeline::processing::normalize::profiles;
use crate::pipeline::processing::normalize::{NormalizationRegistry, NormalizeReport, NormalizedTable};
use crate::pipeline::storage;

/// What happened to one source
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: Source,
    pub normalize: NormalizeReport,
    pub output_file: PathBuf,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub sources: Vec<SourceOutcome>,
    pub merge: MergeReport,
    pub merged_file: PathBuf,
}

/// Load → normalize → export per source, then merge → export.
///
/// Every stage takes its input tables by value or reference and returns new
/// ones; nothing is shared between stages except what is passed along here.
pub struct Pipeline {
    config: Config,
    registry: NormalizationRegistry,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: NormalizationRegistry::new(),
        }
    }

    /// Use a registry with custom normalizers in place of the built-in ones
    pub fn with_registry(config: Config, registry: NormalizationRegistry) -> Self {
        Self { config, registry }
    }

    /// Load, normalize and export a single source.
    ///
    /// The returned table is the one that was exported, including the extra
    /// escaping pass for sources that get one.
    #[instrument(skip(self), fields(source = %source))]
    pub fn process_source(&self, source: Source) -> Result<(NormalizedTable, SourceOutcome)> {
        let profile = profiles::profile(source);
        let started = Instant::now();

        let input = self.config.input_path(profile.input_file);
        let raw = load_delimited(&input, profile.delimiter, source.label())?;
        let (table, report) = self.registry.normalize(source, raw)?;

        let table = if profile.escape_before_export && self.config.double_escape_on_export {
            table.escaped()
        } else {
            table
        };

        let output_file = self.config.output_path(profile.export_file);
        storage::write_source_table(&table, &output_file)?;

        metrics::pipeline::stage_duration(source.label(), started.elapsed().as_secs_f64());
        Ok((
            table,
            SourceOutcome {
                source,
                normalize: report,
                output_file,
            },
        ))
    }

    /// Process all three sources
    pub fn process_sources(&self) -> Result<(Vec<NormalizedTable>, Vec<SourceOutcome>)> {
        fs::create_dir_all(&self.config.output_dir)?;

        let mut tables = Vec::with_capacity(Source::ALL.len());
        let mut outcomes = Vec::with_capacity(Source::ALL.len());
        for source in Source::ALL {
            let (table, outcome) = self.process_source(source)?;
            tables.push(table);
            outcomes.push(outcome);
        }
        Ok((tables, outcomes))
    }

    /// Merge already-normalized tables and persist the directory
    pub fn merge_and_save(&self, tables: &[NormalizedTable]) -> Result<(Vec<MergedListing>, MergeReport, PathBuf)> {
        let started = Instant::now();
        let (merged, report) = merge_sources(tables, COALESCE_POLICY);

        let merged_file = self.config.merged_path();
        storage::write_merged(&merged, &merged_file)?;

        metrics::pipeline::stage_duration("merge", started.elapsed().as_secs_f64());
        Ok((merged, report, merged_file))
    }

    /// Run the complete pipeline
    #[instrument(skip(self))]
    pub fn run(&self) -> Result<PipelineResult> {
        info!("🚀 Starting listing merge pipeline");
        metrics::pipeline::run_started();

        let (tables, sources) = self.process_sources()?;
        let (_, merge, merged_file) = self.merge_and_save(&tables)?;

        info!("✅ Pipeline finished: {} listings in {}", merge.output_rows, merged_file.display());
        Ok(PipelineResult {
            sources,
            merge,
            merged_file,
        })
    }
}
