use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook write failed: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook read failed: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required column '{column}' in {dataset} dataset")]
    MissingColumn { dataset: String, column: String },

    #[error("No normalizer registered for source: {0}")]
    MissingNormalizer(String),

    #[error("Workbook has no sheets: {0}")]
    EmptyWorkbook(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
