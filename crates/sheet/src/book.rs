use crate::error::{Result, SheetError};
use crate::sheet::{sanitize_sheet_name, Sheet};
use indexmap::IndexMap;

/// An ordered collection of sheets (preserves insertion order)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    sheets: IndexMap<String, Sheet>,
}

impl Workbook {
    /// Create a new empty workbook
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of sheets
    #[must_use]
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the workbook is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Get all sheet names in order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    /// Check if a sheet exists
    #[must_use]
    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    /// Append a sheet.
    ///
    /// The sheet name is sanitized into a legal tab name first; a name
    /// that collides with an existing sheet is rejected.
    pub fn push(&mut self, sheet: Sheet) -> Result<()> {
        let name = sanitize_sheet_name(sheet.name());
        if self.sheets.contains_key(&name) {
            return Err(SheetError::SheetAlreadyExists { name });
        }

        let mut sheet = sheet;
        sheet.set_name(&name);
        self.sheets.insert(name, sheet);
        Ok(())
    }

    /// Get a sheet by name
    pub fn get_sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .get(name)
            .ok_or_else(|| SheetError::SheetNotFound {
                name: name.to_string(),
            })
    }

    /// Get a sheet by index (0-based)
    pub fn get_sheet_by_index(&self, index: usize) -> Result<&Sheet> {
        self.sheets
            .get_index(index)
            .map(|(_, sheet)| sheet)
            .ok_or_else(|| SheetError::SheetNotFound {
                name: format!("index {index}"),
            })
    }

    /// Iterate over sheets in order
    pub fn iter(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.values()
    }

    /// Consume the workbook, returning its sheets in order
    #[must_use]
    pub fn into_sheets(self) -> Vec<Sheet> {
        self.sheets.into_values().collect()
    }
}

impl<'a> IntoIterator for &'a Workbook {
    type Item = &'a Sheet;
    type IntoIter = indexmap::map::Values<'a, String, Sheet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sheets.values()
    }
}
