use sheetcast_sheet::{sanitize_sheet_name, Sheet, SheetError, Workbook};
use tempfile::tempdir;

// ===== Workbook Assembly Tests =====

#[test]
fn test_workbook_keeps_insertion_order() {
    let mut book = Workbook::new();
    book.push(Sheet::from_rows("Full Text", &[vec!["page one"], vec!["page two"]]))
        .unwrap();
    book.push(Sheet::single_cell("OCR Unavailable", "service timed out"))
        .unwrap();
    book.push(Sheet::from_rows("Page 2 Table 1", &[vec!["a", "b"]]))
        .unwrap();

    let names: Vec<&str> = book.iter().map(Sheet::name).collect();
    assert_eq!(names, vec!["Full Text", "OCR Unavailable", "Page 2 Table 1"]);
}

#[test]
fn test_workbook_rejects_names_equal_after_sanitizing() {
    let mut book = Workbook::new();
    book.push(Sheet::single_cell("a:b", "1")).unwrap();

    let result = book.push(Sheet::single_cell("a*b", "2"));
    assert!(matches!(
        result,
        Err(SheetError::SheetAlreadyExists { name }) if name == "a_b"
    ));
}

#[test]
fn test_into_sheets() {
    let mut book = Workbook::new();
    book.push(Sheet::single_cell("One", "1")).unwrap();
    book.push(Sheet::single_cell("Two", "2")).unwrap();

    let sheets = book.into_sheets();
    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[1].name(), "Two");
}

#[test]
fn test_sanitize_long_label() {
    let name = sanitize_sheet_name("Page 1000 Table 1000 of a very long report");
    assert!(name.chars().count() <= 31);
    assert!(name.starts_with("Page 1000 Table 1000"));
}

// ===== XLSX Roundtrip Tests =====

#[test]
fn test_xlsx_roundtrip_preserves_grids() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("converted.xlsx");

    let mut book = Workbook::new();
    book.push(Sheet::from_rows("Full Text", &[vec!["Statement"], vec![""], vec!["Total 3"]]))
        .unwrap();
    book.push(Sheet::from_rows(
        "Page 1 OCR",
        &[vec!["Date", "Amount"], vec!["2023-01-15", ""]],
    ))
    .unwrap();
    book.save_as_xlsx(&path).unwrap();

    let loaded = Workbook::from_xlsx(&path).unwrap();
    assert_eq!(loaded.sheet_names(), vec!["Full Text", "Page 1 OCR"]);

    let ocr = loaded.get_sheet("Page 1 OCR").unwrap();
    assert_eq!(ocr.get(0, 0), Some("Date"));
    assert_eq!(ocr.get(0, 1), Some("Amount"));
    assert_eq!(ocr.get(1, 0), Some("2023-01-15"));

    let text = loaded.get_sheet("Full Text").unwrap();
    assert_eq!(text.get(0, 0), Some("Statement"));
    assert_eq!(text.get(2, 0), Some("Total 3"));
}

#[test]
fn test_xlsx_roundtrip_keeps_leading_blank_rows_and_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scanned_first.xlsx");

    let mut book = Workbook::new();
    book.push(Sheet::from_rows("Full Text", &[vec![""], vec!["Closing balance"]]))
        .unwrap();
    book.push(Sheet::from_rows(
        "Page 2 OCR",
        &[vec!["", ""], vec!["", "Amount"], vec!["", "4.50"]],
    ))
    .unwrap();
    book.save_as_xlsx(&path).unwrap();

    let loaded = Workbook::from_xlsx(&path).unwrap();

    let text = loaded.get_sheet("Full Text").unwrap();
    assert_eq!(text.row_count(), 2);
    assert_eq!(text.get(0, 0), Some(""));
    assert_eq!(text.get(1, 0), Some("Closing balance"));

    let ocr = loaded.get_sheet("Page 2 OCR").unwrap();
    assert_eq!(ocr, book.get_sheet("Page 2 OCR").unwrap());
}

#[test]
fn test_save_to_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("out.xlsx");

    let mut book = Workbook::new();
    book.push(Sheet::single_cell("Full Text", "x")).unwrap();

    assert!(book.save_as_xlsx(&path).is_err());
}
