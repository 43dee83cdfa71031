use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{PipelineError, Result};

/// Where the pipeline reads its datasets and writes its workbooks.
///
/// Every field has a default, so a missing `config.toml` simply means
/// "current directory, documented behaviour".
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the three input CSV files
    pub data_dir: PathBuf,
    /// Directory receiving the per-source and merged workbooks
    pub output_dir: PathBuf,
    /// Escape the facebook and website tables a second time right before export
    pub double_escape_on_export: bool,
    /// Optional path for a JSON copy of the report
    pub report_json: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            double_escape_on_export: true,
            report_json: None,
        }
    }
}

impl Config {
    /// Load from a TOML file
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn input_path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    pub fn merged_path(&self) -> PathBuf {
        self.output_path(constants::MERGED_EXPORT)
    }
}
