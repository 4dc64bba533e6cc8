use std::path::PathBuf;
use thiserror::Error;

use crate::core::formula::FormulaError;

pub type TransferResult<T> = Result<T, TransferError>;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid column label '{label}': expected one or two letters (a-zz)")]
    InvalidColumnLabel { label: String },

    #[error("Invalid input in mapping row {row}: {message}")]
    Input { row: usize, message: String },

    #[error("Invalid cell address {cell}: rows and columns start at 1")]
    InvalidCellRef { cell: String },

    #[error("No mappings provided: add at least one mapping row")]
    NoMappings,

    #[error("No source files provided: select at least one source file")]
    NoSources,

    #[error("No base template provided: select the template to fill")]
    NoTemplate,

    #[error("Base template '{}' is not a file", path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("Failed to open '{}': {reason}", path.display())]
    DocumentOpen { path: PathBuf, reason: String },

    #[error("Failed to read source cell {cell}: {reason}")]
    CellRead { cell: String, reason: String },

    #[error("Failed to write target cell {cell}: {reason}")]
    CellWrite { cell: String, reason: String },

    #[error("Formula '{formula}' failed: {source}")]
    Formula {
        formula: String,
        #[source]
        source: FormulaError,
    },

    #[error("Failed to save '{}': {reason}", path.display())]
    DocumentSave { path: PathBuf, reason: String },

    #[error("Output folder '{}' unusable: {reason}", path.display())]
    OutputDir { path: PathBuf, reason: String },

    #[error("No files were processed successfully (0 of {total})")]
    BatchFailed { total: usize },
}

impl TransferError {
    /// Shorthand for an `Input` error on a 1-based mapping row
    pub fn input(row: usize, message: impl Into<String>) -> Self {
        Self::Input {
            row,
            message: message.into(),
        }
    }
}
