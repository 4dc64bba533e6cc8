//! Template documents, edited in place
//!
//! The whole xlsx package is loaded, so number formats, styles, column widths,
//! merged ranges and defined names come through untouched. Only the cells a
//! transfer writes, all on the first worksheet, change.

use crate::error::{TransferError, TransferResult};
use crate::types::{outside_grid, CellRef, CellValue, CellWriter};
use std::fs::File;
use std::path::{Path, PathBuf};
use umya_spreadsheet::{reader, writer, NumberingFormat, Spreadsheet};

/// Applied to dates written into cells that still have the General format
const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// A base template opened for one document's worth of writes
pub struct TemplateDocument {
    path: PathBuf,
    book: Spreadsheet,
}

impl TemplateDocument {
    /// Load the template from disk; every call yields an independent copy
    pub fn open<P: AsRef<Path>>(path: P) -> TransferResult<Self> {
        let path = path.as_ref().to_path_buf();
        let book = reader::xlsx::read(&path).map_err(|e| TransferError::DocumentOpen {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        if book.get_sheet(&0).is_none() {
            return Err(TransferError::DocumentOpen {
                path,
                reason: "workbook contains no sheets".to_string(),
            });
        }
        Ok(Self { path, book })
    }

    /// Save the edited copy as `output`; the template on disk is never touched
    pub fn save(&self, output: &Path) -> TransferResult<()> {
        // Open the destination ourselves so permission problems keep their io kind
        File::create(output).map_err(|e| save_error(output, e))?;

        writer::xlsx::write(&self.book, output).map_err(|e| TransferError::DocumentSave {
            path: output.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl CellWriter for TemplateDocument {
    fn write_cell(&mut self, at: CellRef, value: CellValue) -> TransferResult<()> {
        if !at.in_bounds() {
            return Err(TransferError::CellWrite {
                cell: at.to_string(),
                reason: outside_grid(),
            });
        }

        let sheet = self
            .book
            .get_sheet_mut(&0)
            .ok_or_else(|| TransferError::CellWrite {
                cell: at.to_string(),
                reason: format!("'{}' has no worksheet", self.path.display()),
            })?;
        let cell = sheet.get_cell_mut((at.col, at.row));

        match value {
            CellValue::Empty => {
                cell.set_blank();
            }
            CellValue::Integer(i) => {
                cell.set_value_number(i as f64);
            }
            CellValue::Float(n) => {
                cell.set_value_number(n);
            }
            CellValue::Text(s) | CellValue::Error(s) => {
                cell.set_value_string(s);
            }
            CellValue::Boolean(b) => {
                cell.set_value_bool(b);
            }
            CellValue::DateTime(serial) => {
                cell.set_value_number(serial);
                let general = cell
                    .get_style()
                    .get_number_format()
                    .map_or(true, |nf| nf.get_format_code() == NumberingFormat::FORMAT_GENERAL);
                if general {
                    cell.get_style_mut()
                        .get_number_format_mut()
                        .set_format_code(DATE_FORMAT);
                }
            }
        }
        Ok(())
    }
}

fn save_error(path: &Path, err: std::io::Error) -> TransferError {
    let reason = if err.kind() == std::io::ErrorKind::PermissionDenied {
        "permission denied; close the file if it is open in another program and check folder permissions"
            .to_string()
    } else {
        err.to_string()
    };
    TransferError::DocumentSave {
        path: path.to_path_buf(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::ExcelImporter;
    use crate::types::{Cell, MAX_ROWS};
    use pretty_assertions::assert_eq;
    use rust_xlsxwriter::{Format, Formula, Workbook as XlsxWorkbook};
    use tempfile::TempDir;

    fn write_template(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("base.xlsx");
        let mut book = XlsxWorkbook::new();
        let sheet = book.add_worksheet();
        sheet.set_name("Invoice").unwrap();
        sheet.write_string(0, 0, "Total").unwrap();
        sheet.write_number(1, 1, 5.0).unwrap();
        sheet
            .write_formula(2, 1, Formula::new("=B2*2").set_result("10"))
            .unwrap();
        let percent = Format::new().set_num_format("0.000%");
        sheet.write_number_with_format(3, 1, 0.5, &percent).unwrap();
        book.add_worksheet().set_name("Lookup").unwrap();
        book.save(&path).unwrap();
        path
    }

    #[test]
    fn test_write_and_save_keeps_other_cells() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir);
        let output = dir.path().join("out.xlsx");

        let mut doc = TemplateDocument::open(&template).unwrap();
        doc.write_cell(CellRef::new(5, 1), CellValue::Integer(70)).unwrap();
        doc.write_cell(CellRef::new(5, 2), CellValue::Text("kg".into())).unwrap();
        doc.write_cell(CellRef::new(5, 3), CellValue::Boolean(true)).unwrap();
        doc.write_cell(CellRef::new(5, 4), CellValue::Float(2.5)).unwrap();
        doc.save(&output).unwrap();

        let book = ExcelImporter::new(&output).import_template().unwrap();
        assert_eq!(book.sheets.len(), 2);
        assert_eq!(book.sheets[1].name, "Lookup");

        let sheet = &book.sheets[0];
        assert_eq!(sheet.name, "Invoice");
        assert_eq!(sheet.get(CellRef::new(5, 1)).unwrap(), CellValue::Integer(70));
        assert_eq!(sheet.get(CellRef::new(5, 2)).unwrap(), CellValue::Text("kg".into()));
        assert_eq!(sheet.get(CellRef::new(5, 3)).unwrap(), CellValue::Boolean(true));
        assert_eq!(sheet.get(CellRef::new(5, 4)).unwrap(), CellValue::Float(2.5));
        assert_eq!(sheet.get(CellRef::new(1, 1)).unwrap(), CellValue::Text("Total".into()));
        assert!(matches!(
            sheet.cell(CellRef::new(3, 2)),
            Some(Cell::Formula { formula, .. }) if formula == "B2*2"
        ));
    }

    #[test]
    fn test_write_keeps_destination_number_format() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir);
        let output = dir.path().join("out.xlsx");

        let mut doc = TemplateDocument::open(&template).unwrap();
        doc.write_cell(CellRef::new(4, 2), CellValue::Float(0.75)).unwrap();
        doc.save(&output).unwrap();

        let book = reader::xlsx::read(&output).unwrap();
        let cell = book.get_sheet(&0).unwrap().get_cell("B4").unwrap();
        let format = cell.get_style().get_number_format().unwrap().get_format_code();
        assert_eq!(format, "0.000%");
    }

    #[test]
    fn test_empty_value_blanks_cell() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir);
        let output = dir.path().join("out.xlsx");

        let mut doc = TemplateDocument::open(&template).unwrap();
        doc.write_cell(CellRef::new(1, 1), CellValue::Empty).unwrap();
        doc.save(&output).unwrap();

        let sheet = ExcelImporter::new(&output).import_values().unwrap();
        assert_eq!(sheet.get(CellRef::new(1, 1)).unwrap(), CellValue::Empty);
        assert_eq!(sheet.get(CellRef::new(2, 2)).unwrap(), CellValue::Integer(5));
    }

    #[test]
    fn test_date_gets_date_format_in_general_cell() {
        let dir = TempDir::new().unwrap();
        let template = write_template(&dir);
        let output = dir.path().join("out.xlsx");

        let mut doc = TemplateDocument::open(&template).unwrap();
        doc.write_cell(CellRef::new(6, 1), CellValue::DateTime(45000.5)).unwrap();
        doc.save(&output).unwrap();

        let book = reader::xlsx::read(&output).unwrap();
        let cell = book.get_sheet(&0).unwrap().get_cell("A6").unwrap();
        let format = cell.get_style().get_number_format().unwrap().get_format_code();
        assert_eq!(format, DATE_FORMAT);
    }

    #[test]
    fn test_out_of_grid_write_fails() {
        let dir = TempDir::new().unwrap();
        let mut doc = TemplateDocument::open(write_template(&dir)).unwrap();
        let err = doc
            .write_cell(CellRef::new(MAX_ROWS + 1, 1), CellValue::Integer(1))
            .unwrap_err();
        assert!(matches!(err, TransferError::CellWrite { .. }));
    }

    #[test]
    fn test_open_missing_or_corrupt_is_open_error() {
        let dir = TempDir::new().unwrap();
        let missing = TemplateDocument::open(dir.path().join("missing.xlsx"));
        assert!(matches!(missing, Err(TransferError::DocumentOpen { .. })));

        let corrupt = dir.path().join("corrupt.xlsx");
        std::fs::write(&corrupt, b"not a zip").unwrap();
        assert!(matches!(
            TemplateDocument::open(&corrupt),
            Err(TransferError::DocumentOpen { .. })
        ));
    }

    #[test]
    fn test_save_to_missing_folder_is_save_error() {
        let dir = TempDir::new().unwrap();
        let doc = TemplateDocument::open(write_template(&dir)).unwrap();
        let err = doc
            .save(&dir.path().join("no-such-folder").join("out.xlsx"))
            .unwrap_err();
        assert!(matches!(err, TransferError::DocumentSave { .. }));
    }
}
