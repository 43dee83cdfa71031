//! Metrics for the listing merge pipeline
//!
//! Names follow the Prometheus conventions. Recording is a no-op until
//! [`init`] installs a recorder, so library code and tests can call these
//! functions freely.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, Result};

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Pipeline
    PipelineRuns,
    PipelineStageDuration,

    // Load
    LoadRowsLoaded,
    LoadRowsSkipped,

    // Normalize
    NormalizeRowsDropped,
    NormalizeRowsOutput,

    // Merge
    MergeRowsJoined,
    MergeRowsDroppedWithoutName,
    MergeRowsOutput,
}

impl MetricName {
    /// Get the metric name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::PipelineRuns => "listing_pipeline_runs_total",
            MetricName::PipelineStageDuration => "listing_pipeline_stage_duration_seconds",

            MetricName::LoadRowsLoaded => "listing_load_rows_loaded_total",
            MetricName::LoadRowsSkipped => "listing_load_rows_skipped_total",

            MetricName::NormalizeRowsDropped => "listing_normalize_rows_dropped_total",
            MetricName::NormalizeRowsOutput => "listing_normalize_rows_output_total",

            MetricName::MergeRowsJoined => "listing_merge_rows_joined_total",
            MetricName::MergeRowsDroppedWithoutName => "listing_merge_rows_dropped_without_name_total",
            MetricName::MergeRowsOutput => "listing_merge_rows_output_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder and return a handle for rendering
pub fn init() -> Result<PrometheusHandle> {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    ::metrics::set_global_recorder(recorder)
        .map_err(|_| PipelineError::Config("a metrics recorder is already installed".to_string()))?;
    info!("Metrics recorder initialized");
    Ok(handle)
}

/// Write the current snapshot in Prometheus text format
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    fs::write(path, handle.render())?;
    info!("📈 Wrote metrics snapshot to {}", path.display());
    Ok(())
}

// ============================================================================
// Pipeline Metrics
// ============================================================================

pub mod pipeline {
    use super::MetricName;

    pub fn run_started() {
        ::metrics::counter!(MetricName::PipelineRuns.as_str()).increment(1);
    }

    /// Wall time of one stage (a source label or "merge")
    pub fn stage_duration(stage: &str, secs: f64) {
        ::metrics::histogram!(MetricName::PipelineStageDuration.as_str(), "stage" => stage.to_string())
            .record(secs);
    }
}

// ============================================================================
// Load Metrics
// ============================================================================

pub mod load {
    use super::MetricName;

    pub fn rows_loaded(dataset: &str, count: usize) {
        ::metrics::counter!(MetricName::LoadRowsLoaded.as_str(), "dataset" => dataset.to_string())
            .increment(count as u64);
    }

    /// Lines dropped for a wrong field count or undecodable text
    pub fn rows_skipped(dataset: &str, count: usize) {
        ::metrics::counter!(MetricName::LoadRowsSkipped.as_str(), "dataset" => dataset.to_string())
            .increment(count as u64);
    }
}

// ============================================================================
// Normalize Metrics
// ============================================================================

pub mod normalize {
    use super::MetricName;

    pub fn rows_dropped(source: &str, reason: &'static str, count: usize) {
        ::metrics::counter!(
            MetricName::NormalizeRowsDropped.as_str(),
            "source" => source.to_string(),
            "reason" => reason
        )
        .increment(count as u64);
    }

    pub fn rows_normalized(source: &str, count: usize) {
        ::metrics::counter!(MetricName::NormalizeRowsOutput.as_str(), "source" => source.to_string())
            .increment(count as u64);
    }
}

// ============================================================================
// Merge Metrics
// ============================================================================

pub mod merge {
    use super::MetricName;

    pub fn rows_joined(count: usize) {
        ::metrics::counter!(MetricName::MergeRowsJoined.as_str()).increment(count as u64);
    }

    pub fn rows_dropped_without_name(count: usize) {
        ::metrics::counter!(MetricName::MergeRowsDroppedWithoutName.as_str()).increment(count as u64);
    }

    pub fn rows_merged(count: usize) {
        ::metrics::counter!(MetricName::MergeRowsOutput.as_str()).increment(count as u64);
    }
}
