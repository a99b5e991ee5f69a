//! Text-alignment table detection over layout text.
//!
//! Input is one page rendered as text lines in which wide horizontal gaps
//! became runs of spaces. A table is a run of consecutive lines that all
//! split into the same number (at least `min_cols`) of cells.

use lazy_static::lazy_static;
use regex::Regex;
use sheetcast_sheet::Grid;

lazy_static! {
    // Two or more spaces, tabs or pipes separate cells
    static ref COLUMN_SEPARATOR: Regex = Regex::new(r"(\s{2,}|\t+|\|)+").unwrap();

    // Horizontal rules drawn with dashes or equals signs
    static ref HORIZONTAL_RULE: Regex = Regex::new(r"^[-=+|\s]{3,}$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRegion {
    pub rows: Grid,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone)]
pub struct TableDetector {
    min_rows: usize,
    min_cols: usize,
}

impl Default for TableDetector {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_cols: 2,
        }
    }
}

impl TableDetector {
    pub fn new(min_rows: usize, min_cols: usize) -> Self {
        Self {
            min_rows: min_rows.max(1),
            min_cols: min_cols.max(1),
        }
    }

    pub fn detect_tables(&self, text: &str) -> Vec<TableRegion> {
        let lines: Vec<&str> = text.lines().collect();
        let mut tables = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if let Some(table) = self.extract_table_at(&lines, i) {
                i = table.end_line + 1;
                tables.push(table);
            } else {
                i += 1;
            }
        }

        tables
    }

    fn extract_table_at(&self, lines: &[&str], start: usize) -> Option<TableRegion> {
        let mut rows = Vec::new();
        let mut expected_cols = None;
        let mut end_line = start;

        for (idx, raw) in lines.iter().enumerate().skip(start) {
            let line = raw.trim();

            if line.is_empty() {
                break;
            }
            if HORIZONTAL_RULE.is_match(line) {
                if rows.is_empty() {
                    return None;
                }
                end_line = idx;
                continue;
            }

            let Some(cells) = self.parse_row(line) else {
                break;
            };
            match expected_cols {
                Some(expected) if cells.len() != expected => break,
                Some(_) => {}
                None => expected_cols = Some(cells.len()),
            }

            rows.push(cells);
            end_line = idx;
        }

        if rows.len() >= self.min_rows {
            Some(TableRegion {
                rows,
                start_line: start,
                end_line,
            })
        } else {
            None
        }
    }

    fn parse_row(&self, line: &str) -> Option<Vec<String>> {
        let parts: Vec<String> = COLUMN_SEPARATOR
            .split(line)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if parts.len() >= self.min_cols {
            Some(parts)
        } else {
            None
        }
    }
}
