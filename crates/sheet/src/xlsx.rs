use crate::book::Workbook;
use crate::error::{Result, SheetError};
use crate::sheet::{Grid, Sheet};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Workbook as XlsxWorkbook, Worksheet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Convert a calamine cell to the string shown in the sheet
fn data_to_string(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::Bool(b) => b.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::Error(e) => format!("#ERROR: {e:?}"),
    }
}

impl Sheet {
    /// Write sheet data to a worksheet, one string cell per non-empty grid cell
    fn write_to_worksheet(&self, worksheet: &mut Worksheet) -> Result<()> {
        worksheet.set_name(self.name())?;

        for (row_idx, row) in self.grid().iter().enumerate() {
            let row_num = u32::try_from(row_idx).map_err(|_| SheetError::RowOverflow(row_idx))?;
            for (col_idx, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                let col_num =
                    u16::try_from(col_idx).map_err(|_| SheetError::ColumnOverflow(col_idx))?;
                worksheet.write_string(row_num, col_num, cell)?;
            }
        }

        worksheet.autofit();
        Ok(())
    }
}

impl Workbook {
    fn to_xlsx_workbook(&self) -> Result<XlsxWorkbook> {
        let mut workbook = XlsxWorkbook::new();
        for sheet in self {
            let worksheet = workbook.add_worksheet();
            sheet.write_to_worksheet(worksheet)?;
        }
        Ok(workbook)
    }

    /// Save the workbook to an Excel file, one tab per sheet in order
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or written.
    pub fn save_as_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut workbook = self.to_xlsx_workbook()?;
        workbook.save(path.as_ref())?;
        tracing::debug!(
            sheets = self.len(),
            path = %path.as_ref().display(),
            "wrote xlsx workbook"
        );
        Ok(())
    }

    /// Serialize the workbook to xlsx bytes
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_xlsx_buffer(&self) -> Result<Vec<u8>> {
        let mut workbook = self.to_xlsx_workbook()?;
        Ok(workbook.save_to_buffer()?)
    }

    /// Load every sheet of an Excel file as a string grid
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened or read.
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook: Xlsx<BufReader<File>> = open_workbook(path.as_ref())?;
        let sheet_names = workbook.sheet_names();

        let mut book = Workbook::new();
        for name in sheet_names {
            let range = workbook.worksheet_range(&name)?;
            // The range starts at the first used cell; restore the blank
            // rows and columns before it
            let (first_row, first_col) = range.start().unwrap_or((0, 0));
            let mut grid: Grid = vec![Vec::new(); first_row as usize];
            grid.extend(range.rows().map(|row| {
                let mut cells = vec![String::new(); first_col as usize];
                cells.extend(row.iter().map(data_to_string));
                cells
            }));
            book.push(Sheet::new(&name, grid))?;
        }

        Ok(book)
    }

    /// Get sheet names from an Excel file without loading data
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened.
    pub fn xlsx_sheet_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
        let workbook: Xlsx<BufReader<File>> = open_workbook(path.as_ref())?;
        Ok(workbook.sheet_names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_xlsx_write_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.xlsx");

        let mut book = Workbook::new();
        book.push(Sheet::from_rows(
            "Page 1 Table 1",
            &[vec!["Date", "Amount"], vec!["2023-01-15", "12.50"]],
        ))
        .unwrap();
        book.save_as_xlsx(&path).unwrap();

        let loaded = Workbook::from_xlsx(&path).unwrap();
        let sheet = loaded.get_sheet("Page 1 Table 1").unwrap();

        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.col_count(), 2);
        assert_eq!(sheet.get(0, 1), Some("Amount"));
        assert_eq!(sheet.get(1, 1), Some("12.50"));
    }

    #[test]
    fn test_xlsx_sheet_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("multi.xlsx");

        let mut book = Workbook::new();
        book.push(Sheet::single_cell("Full Text", "hello")).unwrap();
        book.push(Sheet::single_cell("Page 3 OCR", "a")).unwrap();
        book.push(Sheet::single_cell("Page 1 Table 1", "b")).unwrap();
        book.save_as_xlsx(&path).unwrap();

        let names = Workbook::xlsx_sheet_names(&path).unwrap();
        assert_eq!(names, vec!["Full Text", "Page 3 OCR", "Page 1 Table 1"]);
    }

    #[test]
    fn test_buffer_is_zip() {
        let mut book = Workbook::new();
        book.push(Sheet::new("Empty", Vec::new())).unwrap();

        let bytes = book.to_xlsx_buffer().unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_data_to_string() {
        assert_eq!(data_to_string(&Data::Float(42.0)), "42");
        assert_eq!(data_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(data_to_string(&Data::Empty), "");
        assert_eq!(data_to_string(&Data::String("x".into())), "x");
    }
}
