use std::collections::HashMap;

use super::profiles;
use super::{DefaultNormalizer, NormalizeReport, NormalizedTable, SourceNormalizer};
use crate::domain::Source;
use crate::error::{PipelineError, Result};
use crate::pipeline::ingestion::RawTable;

/// Registry for source-specific normalization strategies
pub struct NormalizationRegistry {
    normalizers: HashMap<Source, Box<dyn SourceNormalizer>>,
}

impl NormalizationRegistry {
    /// Create a new normalization registry with the three built-in sources
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for source in Source::ALL {
            registry.register(Box::new(DefaultNormalizer::new(profiles::profile(source))));
        }
        registry
    }

    /// A registry with no normalizers at all
    pub fn empty() -> Self {
        Self {
            normalizers: HashMap::new(),
        }
    }

    /// Register (or replace) the normalizer for its source
    pub fn register(&mut self, normalizer: Box<dyn SourceNormalizer>) {
        self.normalizers.insert(normalizer.source(), normalizer);
    }

    pub fn get_normalizer(&self, source: Source) -> Option<&dyn SourceNormalizer> {
        self.normalizers.get(&source).map(|n| n.as_ref())
    }

    /// Normalize a raw table with the normalizer registered for `source`
    pub fn normalize(&self, source: Source, raw: RawTable) -> Result<(NormalizedTable, NormalizeReport)> {
        match self.get_normalizer(source) {
            Some(normalizer) => normalizer.normalize(raw),
            None => Err(PipelineError::MissingNormalizer(source.to_string())),
        }
    }

    pub fn list_sources(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self.normalizers.keys().copied().collect();
        sources.sort();
        sources
    }
}

impl Default for NormalizationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
