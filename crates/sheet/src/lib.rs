//! Sheet/Workbook model for sheetcast
//!
//! Holds the reconstructed tables of a converted document as named string
//! grids and serializes them to a spreadsheet file, one tab per sheet.
//!
//! # Examples
//!
//! ```
//! use sheetcast_sheet::{Sheet, Workbook};
//!
//! let mut book = Workbook::new();
//! book.push(Sheet::from_rows("Full Text", &[vec!["Invoice 42"]])).unwrap();
//! book.push(Sheet::from_rows(
//!     "Page 1 Table 1",
//!     &[vec!["Date", "Amount"], vec!["2023-01-15"]],
//! ))
//! .unwrap();
//!
//! assert_eq!(book.sheet_names(), vec!["Full Text", "Page 1 Table 1"]);
//! // Ragged rows are padded to a rectangle
//! assert_eq!(book.get_sheet_by_index(1).unwrap().get(1, 1), Some(""));
//! ```
//!
//! ## Writing xlsx
//!
//! ```no_run
//! use sheetcast_sheet::Workbook;
//!
//! let book = Workbook::new();
//! book.save_as_xlsx("out.xlsx").unwrap();
//! ```

mod book;
mod error;
mod sheet;
mod xlsx;

/// Re-export workbook type.
pub use book::Workbook;
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export sheet types and helpers.
pub use sheet::{sanitize_sheet_name, Grid, Sheet, MAX_SHEET_NAME_LEN};
