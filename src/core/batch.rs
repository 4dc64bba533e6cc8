//! Batch processing: one output document per source document
//!
//! Every source gets a template freshly re-read from disk, so nothing written
//! for one document can leak into another. Open and save failures only cost
//! the current document; the batch always runs to the end.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info};

use super::mapping::MappingSpec;
use super::transfer::{MappingReport, TransferEngine};
use crate::error::{TransferError, TransferResult};
use crate::excel::{ExcelImporter, TemplateDocument};

/// Outcome of processing one source document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub source: PathBuf,
    pub output: Option<PathBuf>,
    pub error: Option<String>,
    pub mappings: Vec<MappingReport>,
}

impl DocumentReport {
    /// True only when the output was saved
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.output.is_some()
    }

    /// Mappings that wrote their destination cell
    pub fn mappings_written(&self) -> usize {
        self.mappings.iter().filter(|m| m.is_written()).count()
    }
}

/// Outcome of a whole batch, in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.documents.iter().filter(|d| d.succeeded()).count()
    }

    pub fn total(&self) -> usize {
        self.documents.len()
    }

    /// (documents succeeded, documents attempted)
    pub fn tally(&self) -> (usize, usize) {
        (self.succeeded(), self.total())
    }
}

/// Runs a mapping list over many source documents against one template
pub struct BatchOrchestrator {
    template: PathBuf,
    engine: TransferEngine,
    output_dir: PathBuf,
}

impl BatchOrchestrator {
    pub fn new(
        template: impl Into<PathBuf>,
        mappings: &[MappingSpec],
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template: template.into(),
            engine: TransferEngine::new(mappings),
            output_dir: output_dir.into(),
        }
    }

    /// Process every source in order; never stops early
    pub fn run(&self, sources: &[PathBuf]) -> BatchReport {
        info!(
            "Transferring {} mapping(s) into {} document(s)",
            self.engine.len(),
            sources.len()
        );

        let documents = sources.iter().map(|source| self.process(source)).collect();
        let report = BatchReport { documents };

        let (succeeded, total) = report.tally();
        info!("Successfully processed {} out of {} source file(s)", succeeded, total);
        report
    }

    fn process(&self, source: &Path) -> DocumentReport {
        info!("Processing source file: {}", source.display());

        let mut report = DocumentReport {
            source: source.to_path_buf(),
            output: None,
            error: None,
            mappings: Vec::new(),
        };

        match self.transfer_document(source, &mut report.mappings) {
            Ok(output) => {
                info!("Output saved as: {}", output.display());
                report.output = Some(output);
            }
            Err(e) => {
                error!("{}", e);
                report.error = Some(e.to_string());
            }
        }
        report
    }

    fn transfer_document(
        &self,
        source: &Path,
        mappings: &mut Vec<MappingReport>,
    ) -> TransferResult<PathBuf> {
        let output = self.output_path(source)?;

        let source_sheet = ExcelImporter::new(source).import_values()?;
        debug!("Read {} cell(s) from '{}'", source_sheet.len(), source_sheet.name);

        // Fresh template for every document
        let mut template = TemplateDocument::open(&self.template)?;
        *mappings = self.engine.transfer(&source_sheet, &mut template);

        template.save(&output)?;
        Ok(output)
    }

    /// `output_dir/<source file name>`, refusing to overwrite the source or the template
    fn output_path(&self, source: &Path) -> TransferResult<PathBuf> {
        let name = source.file_name().ok_or_else(|| TransferError::DocumentOpen {
            path: source.to_path_buf(),
            reason: "path has no file name".to_string(),
        })?;
        let output = self.output_dir.join(name);

        if same_file(&output, source) {
            return Err(TransferError::DocumentSave {
                path: output,
                reason: "output would overwrite the source document".to_string(),
            });
        }
        if same_file(&output, &self.template) {
            return Err(TransferError::DocumentSave {
                path: output,
                reason: "output would overwrite the base template".to_string(),
            });
        }
        Ok(output)
    }
}

/// Both paths exist and name the same file
fn same_file(a: &Path, b: &Path) -> bool {
    matches!((a.canonicalize(), b.canonicalize()), (Ok(a), Ok(b)) if a == b)
}

/// Resolve the output folder `name` next to the template, creating it if absent
pub fn prepare_output_dir(template: &Path, name: &str) -> TransferResult<PathBuf> {
    let name = name.trim();
    let base = template.parent().unwrap_or_else(|| Path::new(""));
    let dir = base.join(name);

    if name.is_empty() {
        return Err(TransferError::OutputDir {
            path: dir,
            reason: "output folder name not specified".to_string(),
        });
    }

    if dir.exists() {
        if !dir.is_dir() {
            return Err(TransferError::OutputDir {
                path: dir,
                reason: "exists but is not a folder".to_string(),
            });
        }
        info!("Using existing output folder: {}", dir.display());
    } else {
        fs::create_dir_all(&dir).map_err(|e| TransferError::OutputDir {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
        info!("Created output folder: {}", dir.display());
    }
    Ok(dir)
}
