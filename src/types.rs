use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::core::column::column_label;
use crate::error::{TransferError, TransferResult};

/// Number of rows an xlsx worksheet can address
pub const MAX_ROWS: u32 = 1_048_576;
/// Number of columns an xlsx worksheet can address
pub const MAX_COLUMNS: u32 = 16_384;

//==============================================================================
// Cell Values
//==============================================================================

/// A single resolved cell value
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    /// Unused or cleared cell
    #[default]
    Empty,
    /// Whole number
    Integer(i64),
    /// Fractional number
    Float(f64),
    /// Text
    Text(String),
    /// TRUE / FALSE
    Boolean(bool),
    /// Date or time as an Excel serial number
    DateTime(f64),
    /// Spreadsheet error such as #DIV/0!
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(serial) => write!(f, "{}", serial),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

/// What a worksheet cell holds: a plain value, or a formula with its last computed result
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(CellValue),
    Formula { formula: String, cached: CellValue },
}

impl Cell {
    /// The resolved value (cached result for formula cells)
    pub fn value(&self) -> &CellValue {
        match self {
            Cell::Value(v) => v,
            Cell::Formula { cached, .. } => cached,
        }
    }
}

//==============================================================================
// Addresses
//==============================================================================

/// A 1-based (row, column) address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Whether the address fits inside an xlsx worksheet
    pub fn in_bounds(&self) -> bool {
        (1..=MAX_ROWS).contains(&self.row) && (1..=MAX_COLUMNS).contains(&self.col)
    }
}

pub(crate) fn outside_grid() -> String {
    format!(
        "outside the worksheet grid ({} rows x {} columns)",
        MAX_ROWS, MAX_COLUMNS
    )
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match column_label(self.col) {
            Some(letters) => write!(f, "{}{} ({},{})", letters, self.row, self.row, self.col),
            None => write!(f, "({},{})", self.row, self.col),
        }
    }
}

//==============================================================================
// Sheets and Workbooks
//==============================================================================

/// A sparse worksheet keyed by 1-based (row, column)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<CellRef, Cell>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Read the resolved value at `at`; unused cells read as `Empty`
    pub fn get(&self, at: CellRef) -> TransferResult<CellValue> {
        if !at.in_bounds() {
            return Err(TransferError::CellRead {
                cell: at.to_string(),
                reason: outside_grid(),
            });
        }
        Ok(self
            .cells
            .get(&at)
            .map(|cell| cell.value().clone())
            .unwrap_or_default())
    }

    /// Overwrite the cell at `at` with a plain value; `Empty` clears it
    pub fn set(&mut self, at: CellRef, value: CellValue) -> TransferResult<()> {
        if !at.in_bounds() {
            return Err(TransferError::CellWrite {
                cell: at.to_string(),
                reason: outside_grid(),
            });
        }
        if value.is_empty() {
            self.cells.remove(&at);
        } else {
            self.cells.insert(at, Cell::Value(value));
        }
        Ok(())
    }

    /// Store a raw cell, used when loading a workbook
    pub fn insert(&mut self, at: CellRef, cell: Cell) {
        self.cells.insert(at, cell);
    }

    pub fn cell(&self, at: CellRef) -> Option<&Cell> {
        self.cells.get(&at)
    }

    /// Iterate populated cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (&CellRef, &Cell)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A destination transfers write resolved values into
pub trait CellWriter {
    /// Overwrite the cell at `at`; `Empty` blanks it
    fn write_cell(&mut self, at: CellRef, value: CellValue) -> TransferResult<()>;
}

impl CellWriter for Sheet {
    fn write_cell(&mut self, at: CellRef, value: CellValue) -> TransferResult<()> {
        self.set(at, value)
    }
}

/// An ordered set of sheets as read from disk
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_get_unused_cell_is_empty() {
        let sheet = Sheet::new("Sheet1");
        assert_eq!(sheet.get(CellRef::new(10, 4)).unwrap(), CellValue::Empty);
    }

    #[test]
    fn test_sheet_set_then_get() {
        let mut sheet = Sheet::new("Sheet1");
        sheet
            .set(CellRef::new(2, 3), CellValue::Integer(7))
            .unwrap();
        assert_eq!(sheet.get(CellRef::new(2, 3)).unwrap(), CellValue::Integer(7));
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn test_sheet_set_empty_clears_cell() {
        let mut sheet = Sheet::new("Sheet1");
        sheet
            .set(CellRef::new(1, 1), CellValue::Text("x".to_string()))
            .unwrap();
        sheet.set(CellRef::new(1, 1), CellValue::Empty).unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_sheet_formula_cell_reads_cached_value() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.insert(
            CellRef::new(1, 1),
            Cell::Formula {
                formula: "B1*2".to_string(),
                cached: CellValue::Integer(4),
            },
        );
        assert_eq!(sheet.get(CellRef::new(1, 1)).unwrap(), CellValue::Integer(4));
    }

    #[test]
    fn test_sheet_out_of_grid_access_fails() {
        let mut sheet = Sheet::new("Sheet1");
        let beyond = CellRef::new(MAX_ROWS + 1, 1);

        assert!(matches!(
            sheet.get(beyond),
            Err(TransferError::CellRead { .. })
        ));
        assert!(matches!(
            sheet.set(beyond, CellValue::Integer(1)),
            Err(TransferError::CellWrite { .. })
        ));
        assert!(matches!(
            sheet.get(CellRef::new(1, 0)),
            Err(TransferError::CellRead { .. })
        ));
    }

    #[test]
    fn test_cell_ref_display() {
        assert_eq!(CellRef::new(5, 1).to_string(), "A5 (5,1)");
        assert_eq!(CellRef::new(2, 28).to_string(), "AB2 (2,28)");
        assert_eq!(CellRef::new(3, 800).to_string(), "(3,800)");
    }

    #[test]
    fn test_cell_value_display() {
        assert_eq!(CellValue::Integer(70).to_string(), "70");
        assert_eq!(CellValue::Float(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Boolean(true).to_string(), "TRUE");
        assert_eq!(CellValue::Empty.to_string(), "");
    }
}
