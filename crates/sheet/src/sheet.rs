/// A rectangular table of cell strings in row-major order.
pub type Grid = Vec<Vec<String>>;

/// Maximum tab name length accepted by spreadsheet applications.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// A named grid of strings, always rectangular.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sheet {
    name: String,
    grid: Grid,
}

impl Sheet {
    /// Create a sheet, padding ragged rows with empty strings
    #[must_use]
    pub fn new(name: &str, grid: Grid) -> Self {
        let mut grid = grid;
        pad_rows(&mut grid);
        Sheet {
            name: name.to_string(),
            grid,
        }
    }

    /// Create a sheet from borrowed string rows
    #[must_use]
    pub fn from_rows<S: AsRef<str>>(name: &str, rows: &[Vec<S>]) -> Self {
        let grid = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.as_ref().to_string()).collect())
            .collect();
        Self::new(name, grid)
    }

    /// Create a single-cell sheet holding one message
    #[must_use]
    pub fn single_cell(name: &str, text: &str) -> Self {
        Self::new(name, vec![vec![text.to_string()]])
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Borrow the cell grid
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Get the number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.grid.len()
    }

    /// Get the number of columns
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    /// Check if the sheet has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Get a cell by (row, col), 0-based
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.grid
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
    }

    /// True when every cell is an empty string
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.grid.iter().flatten().all(String::is_empty)
    }
}

fn pad_rows(grid: &mut Grid) {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    for row in grid.iter_mut() {
        row.resize(width, String::new());
    }
}

/// Turn an arbitrary label into a legal spreadsheet tab name.
///
/// Forbidden characters are replaced with `_`, leading and trailing
/// apostrophes are removed and the result is truncated to
/// [`MAX_SHEET_NAME_LEN`] characters. An empty result becomes `"Sheet"`.
#[must_use]
pub fn sanitize_sheet_name(label: &str) -> String {
    let replaced: String = label
        .chars()
        .map(|c| {
            if FORBIDDEN_NAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim().trim_matches('\'');
    let truncated: String = trimmed.chars().take(MAX_SHEET_NAME_LEN).collect();
    let truncated = truncated.trim_end().trim_end_matches('\'');

    if truncated.is_empty() {
        "Sheet".to_string()
    } else {
        truncated.to_string()
    }
}
