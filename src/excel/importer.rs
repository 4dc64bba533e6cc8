//! Excel importer implementation - spreadsheet file → in-memory sheets

use crate::error::{TransferError, TransferResult};
use crate::types::{Cell, CellRef, CellValue, Sheet, Workbook};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Largest float that still converts to an exact integer
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Reads xlsx/xlsm/xls/xlsb/ods files through calamine
pub struct ExcelImporter {
    path: PathBuf,
}

impl ExcelImporter {
    /// Create a new Excel importer
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Resolved values of the first sheet, as a source document is read
    pub fn import_values(&self) -> TransferResult<Sheet> {
        let mut workbook = self.open()?;
        let name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| self.open_error("workbook contains no sheets"))?;

        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| self.open_error(format!("failed to read sheet '{}': {}", name, e)))?;

        let mut sheet = Sheet::new(name);
        load_values(&range, &mut sheet);
        Ok(sheet)
    }

    /// Every sheet with values and formulas, as a template is read
    pub fn import_template(&self) -> TransferResult<Workbook> {
        let mut workbook = self.open()?;
        let sheet_names = workbook.sheet_names().to_vec();
        if sheet_names.is_empty() {
            return Err(self.open_error("workbook contains no sheets"));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in sheet_names {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| self.open_error(format!("failed to read sheet '{}': {}", name, e)))?;

            let mut sheet = Sheet::new(name.clone());
            load_values(&range, &mut sheet);

            // Formulas are optional: formats without them simply return an error here
            if let Ok(formulas) = workbook.worksheet_formula(&name) {
                load_formulas(&formulas, &mut sheet);
            }
            sheets.push(sheet);
        }

        Ok(Workbook::new(sheets))
    }

    fn open(&self) -> TransferResult<Sheets<BufReader<File>>> {
        open_workbook_auto(&self.path).map_err(|e| self.open_error(e.to_string()))
    }

    fn open_error(&self, reason: impl Into<String>) -> TransferError {
        TransferError::DocumentOpen {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

/// 1-based address of a cell at `(row, col)` inside a range starting at `start`
fn absolute(start: (u32, u32), row: usize, col: usize) -> CellRef {
    CellRef::new(start.0 + row as u32 + 1, start.1 + col as u32 + 1)
}

fn load_values(range: &Range<Data>, sheet: &mut Sheet) {
    let Some(start) = range.start() else {
        return;
    };
    for (row, col, data) in range.used_cells() {
        let value = data_to_cell_value(data);
        if !value.is_empty() {
            sheet.insert(absolute(start, row, col), Cell::Value(value));
        }
    }
}

fn load_formulas(range: &Range<String>, sheet: &mut Sheet) {
    let Some(start) = range.start() else {
        return;
    };
    for (row, col, formula) in range.used_cells() {
        if formula.is_empty() {
            continue;
        }
        let at = absolute(start, row, col);
        let cached = sheet.cell(at).map(|c| c.value().clone()).unwrap_or_default();
        sheet.insert(
            at,
            Cell::Formula {
                formula: formula.trim_start_matches('=').to_string(),
                cached,
            },
        );
    }
}

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => {
            // xlsx stores every number as a double; whole ones read back as integers
            if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER {
                CellValue::Integer(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}
