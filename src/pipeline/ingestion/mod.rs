// Pipeline ingestion: delimited file loading

pub mod loader;

pub use loader::{load_delimited, read_delimited, LoadReport, RawTable};
