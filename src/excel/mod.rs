//! Spreadsheet file I/O
//!
//! - Import: any calamine-readable file → [`Sheet`](crate::types::Sheet) / [`Workbook`](crate::types::Workbook)
//! - Templates: .xlsx loaded whole, written cell by cell, saved under a new name

mod importer;
mod template;

pub use importer::ExcelImporter;
pub use template::TemplateDocument;
