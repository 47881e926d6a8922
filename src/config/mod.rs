#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "../courses";
pub const DEFAULT_SUFFIX: &str = "_clean";
pub const DEFAULT_INDENT: usize = 4;
pub const DEFAULT_DEPARTMENTS_NAME: &str = "depts";

/// 單次正規化工作的完整設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub output_suffix: String,
    pub indent: usize,
}

impl JobConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            output_suffix: DEFAULT_SUFFIX.to_string(),
            indent: DEFAULT_INDENT,
        }
    }
}

impl ConfigProvider for JobConfig {
    fn input_path(&self) -> &Path {
        &self.input_path
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn output_suffix(&self) -> &str {
        &self.output_suffix
    }

    fn indent(&self) -> usize {
        self.indent
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input_path)?;
        validation::validate_path("output_dir", &self.output_dir)?;
        validation::validate_range("indent", self.indent, 0, 16)?;
        Ok(())
    }
}
