// Observability: metrics recording and snapshot export

pub mod metrics;

pub use metrics::{init, write_snapshot, MetricName};
