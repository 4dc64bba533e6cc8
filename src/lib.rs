//! cellxfer - batch spreadsheet cell transfer
//!
//! Reads values from source spreadsheets and writes them into fresh copies
//! of a base template, one output file per source.
//!
//! # Features
//!
//! - Mappings from one source cell to one template cell (columns `a`-`zz`)
//! - Optional single-variable transforms (`X * 2.54`, `round(x / 3, 2)`)
//!   evaluated by a small whitelisted interpreter
//! - Per-mapping and per-document failure isolation with a final tally
//! - YAML job files and a JSON batch report
//!
//! # Example
//!
//! ```no_run
//! use royalbit_cellxfer::core::{build_mappings, prepare_output_dir, BatchOrchestrator, RawMapping};
//! use std::path::{Path, PathBuf};
//!
//! let template = Path::new("base.xlsx");
//! let mappings = build_mappings(&[RawMapping::new("2", "c", "5", "a").with_formula("X*10")])?;
//! let output_dir = prepare_output_dir(template, "filled")?;
//!
//! let batch = BatchOrchestrator::new(template, &mappings, output_dir);
//! let report = batch.run(&[PathBuf::from("jan.xlsx"), PathBuf::from("feb.xlsx")]);
//!
//! let (succeeded, total) = report.tally();
//! println!("{} of {} processed", succeeded, total);
//! # Ok::<(), royalbit_cellxfer::error::TransferError>(())
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod job;
pub mod types;

// Re-export commonly used types
pub use error::{TransferError, TransferResult};
pub use types::{Cell, CellRef, CellValue, Sheet, Workbook};
