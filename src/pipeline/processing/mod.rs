// Pipeline processing: per-source normalization and cross-source merge

pub mod merge;
pub mod normalize;
