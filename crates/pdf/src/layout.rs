//! Layout reconstruction: positioned words to a rectangular grid.
//!
//! The pipeline runs in four steps over the words of one page:
//!
//! 1. [`LayoutEngine::segment_lines`] groups words into visual rows by
//!    vertical proximity.
//! 2. [`LayoutEngine::merge_line`] fuses words separated by less than a
//!    fraction of the average character width into multi-word spans.
//! 3. [`LayoutEngine::detect_columns`] clusters the distinct span left
//!    edges into column boundaries with a single greedy pass.
//! 4. [`LayoutEngine::assemble_grid`] drops every span into the nearest
//!    boundary at or left of it.
//!
//! Column assignment is best effort. Two spans landing in the same cell
//! keep the last one, and genuine columns closer than one average
//! character width collapse into one.
//!
//! # Example
//!
//! ```
//! use sheetcast_pdf::layout::LayoutEngine;
//! use sheetcast_pdf::word::PositionedWord;
//!
//! let words = vec![
//!     PositionedWord::new("Date", 10.0, 100.0, 40.0, 112.0),
//!     PositionedWord::new("Amount", 200.0, 100.0, 248.0, 112.0),
//!     PositionedWord::new("2023-01-15", 10.0, 130.0, 85.0, 142.0),
//! ];
//!
//! let grid = LayoutEngine::default().reconstruct(&words);
//! assert_eq!(grid, vec![vec!["Date", "Amount"], vec!["2023-01-15", ""]]);
//! ```

use crate::word::{average_char_width, MergedSpan, PositionedWord};
use sheetcast_sheet::Grid;

/// Words sharing one visual row, sorted by `x0`.
pub type Line = Vec<PositionedWord>;

/// Tunable thresholds of the layout pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    /// A word starts a new line when its top lies more than this fraction
    /// of the previous word's height below the previous top.
    pub line_break_ratio: f64,
    /// Adjacent words merge when their gap is below this multiple of the
    /// average character width.
    pub merge_gap_ratio: f64,
    /// Minimum separation between column boundaries, and the left-edge
    /// tolerance of grid assignment, as a multiple of the average
    /// character width.
    pub column_gap_ratio: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            line_break_ratio: 0.7,
            merge_gap_ratio: 0.8,
            column_gap_ratio: 1.0,
        }
    }
}

/// Ascending, unique column start positions for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSet(Vec<f64>);

impl ColumnSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.0
    }
}

/// Grid reconstruction over positioned words.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    params: LayoutParams,
}

impl LayoutEngine {
    pub fn new(params: LayoutParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Run the whole pipeline over the words of one page.
    pub fn reconstruct(&self, words: &[PositionedWord]) -> Grid {
        let avg_char_width = average_char_width(words);
        let lines = self.segment_lines(words);
        let merged: Vec<Vec<MergedSpan>> = lines
            .iter()
            .map(|line| self.merge_line(line, avg_char_width))
            .collect();
        let columns = self.detect_columns(merged.iter().flatten(), avg_char_width);

        tracing::debug!(
            words = words.len(),
            lines = merged.len(),
            columns = columns.len(),
            avg_char_width,
            "reconstructed page layout"
        );

        self.assemble_grid(&merged, &columns, avg_char_width)
    }

    /// Group words into lines ordered top to bottom.
    pub fn segment_lines(&self, words: &[PositionedWord]) -> Vec<Line> {
        let mut sorted = words.to_vec();
        sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then_with(|| a.x0.total_cmp(&b.x0)));

        let mut lines: Vec<Line> = Vec::new();
        let mut current: Line = Vec::new();

        for word in sorted {
            if let Some(prev) = current.last() {
                if word.top > prev.top + prev.height * self.params.line_break_ratio {
                    lines.push(std::mem::take(&mut current));
                }
            }
            current.push(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }

        for line in &mut lines {
            line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
        }

        lines
    }

    /// Fuse horizontally adjacent words of one line.
    pub fn merge_line(&self, line: &[PositionedWord], avg_char_width: f64) -> Vec<MergedSpan> {
        let threshold = avg_char_width * self.params.merge_gap_ratio;
        let mut spans = Vec::new();
        let mut words = line.iter();

        let Some(first) = words.next() else {
            return spans;
        };
        let mut current = first.clone();

        for next in words {
            if next.x0 - current.x1 < threshold {
                current.text.push(' ');
                current.text.push_str(&next.text);
                current.x1 = next.x1;
            } else {
                spans.push(std::mem::replace(&mut current, next.clone()));
            }
        }
        spans.push(current);

        spans
    }

    /// Cluster span left edges into column boundaries.
    pub fn detect_columns<'a, I>(&self, spans: I, avg_char_width: f64) -> ColumnSet
    where
        I: IntoIterator<Item = &'a MergedSpan>,
    {
        let mut starts: Vec<f64> = spans.into_iter().map(|span| span.x0).collect();
        starts.sort_by(f64::total_cmp);
        starts.dedup();

        let min_gap = avg_char_width * self.params.column_gap_ratio;
        let mut boundaries: Vec<f64> = Vec::new();
        for x0 in starts {
            match boundaries.last() {
                Some(&last) if x0 <= last + min_gap => {}
                _ => boundaries.push(x0),
            }
        }

        ColumnSet(boundaries)
    }

    /// Place each span in the cell of its nearest admissible boundary.
    ///
    /// A boundary is admissible when the span does not start more than
    /// the tolerance to its left. Spans with no admissible boundary are
    /// dropped.
    pub fn assemble_grid(
        &self,
        lines: &[Vec<MergedSpan>],
        columns: &ColumnSet,
        avg_char_width: f64,
    ) -> Grid {
        let tolerance = avg_char_width * self.params.column_gap_ratio;
        let mut grid = Vec::with_capacity(lines.len());

        for line in lines {
            let mut row = vec![String::new(); columns.len()];
            for span in line {
                match nearest_column(span.x0, columns, tolerance) {
                    Some(index) => row[index].clone_from(&span.text),
                    None => tracing::debug!(
                        x0 = span.x0,
                        text = %span.text,
                        "span left of every column boundary, dropped"
                    ),
                }
            }
            grid.push(row);
        }

        grid
    }
}

fn nearest_column(x0: f64, columns: &ColumnSet, tolerance: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &boundary) in columns.boundaries().iter().enumerate() {
        if x0 + tolerance <= boundary {
            continue;
        }
        let distance = (x0 - boundary).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}
