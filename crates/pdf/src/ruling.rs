//! Ruled-table detection from drawn line segments.
//!
//! Horizontal and vertical rulings that touch each other form a lattice.
//! Each lattice with at least two distinct rows of rulings in each
//! direction becomes a table whose cells are the rectangles between
//! neighbouring rulings. Cell text is every word whose centre falls in
//! the rectangle, in reading order.
//!
//! Cells spanning several lattice rectangles (merged cells) are not
//! reconstructed: their text lands in the rectangle holding its centre.

use crate::word::PositionedWord;
use sheetcast_sheet::Grid;

/// A straight line segment in top-down page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Segment {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    /// y, x-start, x-end
    Horizontal(f64, f64, f64),
    /// x, y-start, y-end
    Vertical(f64, f64, f64),
}

impl Edge {
    fn from_segment(segment: &Segment, tolerance: f64) -> Option<Self> {
        let dx = (segment.x1 - segment.x0).abs();
        let dy = (segment.y1 - segment.y0).abs();
        if dx <= tolerance && dy <= tolerance {
            return None;
        }
        if dy <= tolerance {
            let y = (segment.y0 + segment.y1) / 2.0;
            Some(Edge::Horizontal(
                y,
                segment.x0.min(segment.x1),
                segment.x0.max(segment.x1),
            ))
        } else if dx <= tolerance {
            let x = (segment.x0 + segment.x1) / 2.0;
            Some(Edge::Vertical(
                x,
                segment.y0.min(segment.y1),
                segment.y0.max(segment.y1),
            ))
        } else {
            None
        }
    }

    fn touches(&self, other: &Edge, tolerance: f64) -> bool {
        match (self, other) {
            (Edge::Horizontal(y, hx0, hx1), Edge::Vertical(x, vy0, vy1))
            | (Edge::Vertical(x, vy0, vy1), Edge::Horizontal(y, hx0, hx1)) => {
                *x >= hx0 - tolerance
                    && *x <= hx1 + tolerance
                    && *y >= vy0 - tolerance
                    && *y <= vy1 + tolerance
            }
            _ => false,
        }
    }
}

/// Finds tables outlined by ruling lines.
#[derive(Debug, Clone)]
pub struct RulingTableFinder {
    /// Rulings closer than this snap to the same position.
    snap_tolerance: f64,
    /// Rulings whose ends come this close are treated as joined.
    join_tolerance: f64,
}

impl Default for RulingTableFinder {
    fn default() -> Self {
        Self {
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
        }
    }
}

impl RulingTableFinder {
    pub fn new(snap_tolerance: f64, join_tolerance: f64) -> Self {
        Self {
            snap_tolerance,
            join_tolerance,
        }
    }

    /// Detect tables, ordered top to bottom then left to right.
    pub fn find_tables(&self, segments: &[Segment], words: &[PositionedWord]) -> Vec<Grid> {
        let edges: Vec<Edge> = segments
            .iter()
            .filter_map(|s| Edge::from_segment(s, self.snap_tolerance))
            .collect();
        if edges.is_empty() {
            return Vec::new();
        }

        let mut reading_order = words.to_vec();
        reading_order.sort_by(|a, b| a.top.total_cmp(&b.top).then_with(|| a.x0.total_cmp(&b.x0)));

        let mut tables: Vec<(f64, f64, Grid)> = self
            .lattices(&edges)
            .into_iter()
            .filter_map(|lattice| {
                let (xs, ys) = self.lattice_lines(&lattice);
                if xs.len() < 2 || ys.len() < 2 {
                    return None;
                }
                let grid = fill_cells(&xs, &ys, &reading_order);
                if grid.iter().flatten().all(String::is_empty) {
                    tracing::debug!(
                        rows = ys.len() - 1,
                        cols = xs.len() - 1,
                        "ruled lattice without text, skipped"
                    );
                    return None;
                }
                Some((ys[0], xs[0], grid))
            })
            .collect();

        tables.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));
        tables.into_iter().map(|(_, _, grid)| grid).collect()
    }

    /// Group edges into connected components.
    fn lattices(&self, edges: &[Edge]) -> Vec<Vec<Edge>> {
        let mut parent: Vec<usize> = (0..edges.len()).collect();

        for i in 0..edges.len() {
            for j in (i + 1)..edges.len() {
                if edges[i].touches(&edges[j], self.join_tolerance) {
                    let a = find_root(&mut parent, i);
                    let b = find_root(&mut parent, j);
                    if a != b {
                        parent[b] = a;
                    }
                }
            }
        }

        let mut groups: Vec<(usize, Vec<Edge>)> = Vec::new();
        for (i, edge) in edges.iter().enumerate() {
            let root = find_root(&mut parent, i);
            match groups.iter_mut().find(|(r, _)| *r == root) {
                Some((_, members)) => members.push(*edge),
                None => groups.push((root, vec![*edge])),
            }
        }

        groups.into_iter().map(|(_, members)| members).collect()
    }

    /// Distinct vertical (x) and horizontal (y) ruling positions.
    fn lattice_lines(&self, lattice: &[Edge]) -> (Vec<f64>, Vec<f64>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for edge in lattice {
            match *edge {
                Edge::Horizontal(y, _, _) => ys.push(y),
                Edge::Vertical(x, _, _) => xs.push(x),
            }
        }
        (
            snap_positions(xs, self.snap_tolerance),
            snap_positions(ys, self.snap_tolerance),
        )
    }
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Collapse positions within `tolerance` of their neighbour into their mean.
fn snap_positions(mut values: Vec<f64>, tolerance: f64) -> Vec<f64> {
    values.sort_by(f64::total_cmp);

    let mut snapped = Vec::new();
    let mut cluster: Vec<f64> = Vec::new();
    for value in values {
        if let Some(&last) = cluster.last() {
            if value - last > tolerance {
                snapped.push(cluster.iter().sum::<f64>() / cluster.len() as f64);
                cluster.clear();
            }
        }
        cluster.push(value);
    }
    if !cluster.is_empty() {
        snapped.push(cluster.iter().sum::<f64>() / cluster.len() as f64);
    }

    snapped
}

fn fill_cells(xs: &[f64], ys: &[f64], words: &[PositionedWord]) -> Grid {
    let mut grid = vec![vec![String::new(); xs.len() - 1]; ys.len() - 1];

    for word in words {
        let cx = (word.x0 + word.x1) / 2.0;
        let cy = (word.top + word.bottom) / 2.0;
        let (Some(col), Some(row)) = (interval_index(xs, cx), interval_index(ys, cy)) else {
            continue;
        };
        let cell = &mut grid[row][col];
        if !cell.is_empty() {
            cell.push(' ');
        }
        cell.push_str(word.text.trim());
    }

    grid
}

fn interval_index(bounds: &[f64], value: f64) -> Option<usize> {
    bounds
        .windows(2)
        .position(|pair| value >= pair[0] && value < pair[1])
}
