//! YAML job files
//!
//! A job file captures everything one `run` needs so a batch can be repeated:
//!
//! ```yaml
//! template: base.xlsx
//! output: filled
//! sources:
//!   - incoming/2024-01.xlsx
//!   - incoming/2024-02.xlsx
//! mappings:
//!   - { from_row: 2, from_col: c, to_row: 5, to_col: a, formula: "X*10" }
//!   - { from_row: 3, from_col: b, to_row: 6, to_col: a }
//! ```
//!
//! Relative paths are resolved against the job file's directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::mapping::RawMapping;
use crate::error::TransferResult;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Base template every output starts from
    #[serde(default)]
    pub template: Option<PathBuf>,
    /// Output folder name, created next to the template
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub mappings: Vec<RawMapping>,
}

impl JobConfig {
    pub fn from_yaml(content: &str) -> TransferResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(template) = self.template.take() {
            self.template = Some(base.join(template));
        }
        for source in &mut self.sources {
            *source = base.join(&*source);
        }
    }
}

/// Read a job file and resolve its paths against the file's directory
pub fn parse_job(path: &Path) -> TransferResult<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    let mut job = JobConfig::from_yaml(&content)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    job.resolve_paths(base);
    Ok(job)
}
