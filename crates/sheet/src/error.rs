use thiserror::Error;

/// Errors that can occur while building or serializing a workbook
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("Sheet already exists: {name}")]
    SheetAlreadyExists { name: String },

    #[error("Row index overflow: {0}")]
    RowOverflow(usize),

    #[error("Column index overflow: {0}")]
    ColumnOverflow(usize),

    #[error("XLSX error: {0}")]
    Xlsx(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rust_xlsxwriter::XlsxError> for SheetError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        SheetError::Xlsx(err.to_string())
    }
}

impl From<calamine::XlsxError> for SheetError {
    fn from(err: calamine::XlsxError) -> Self {
        SheetError::Xlsx(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
