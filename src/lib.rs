pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;

// Domain data shapes shared across layers
pub mod domain;

pub mod observability;
