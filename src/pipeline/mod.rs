// Data processing pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod storage;

// Re-export key types from each stage
pub use orchestrator::{Pipeline, PipelineResult, SourceOutcome};
pub use processing::merge;
pub use processing::normalize;
