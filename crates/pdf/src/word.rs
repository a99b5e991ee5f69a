//! The positioned-word model shared by the native and OCR paths.
//!
//! Coordinates are absolute and top-down: `top < bottom` and `x0 < x1`
//! within a single page.

/// A text fragment with its bounding box on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedWord {
    pub text: String,
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
    /// Always `bottom - top`.
    pub height: f64,
}

impl PositionedWord {
    /// Build a word from its box edges.
    ///
    /// Reversed edges are swapped so that `x1 >= x0` and `bottom >= top`.
    pub fn new(text: impl Into<String>, x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        let (x0, x1) = if x1 < x0 { (x1, x0) } else { (x0, x1) };
        let (top, bottom) = if bottom < top { (bottom, top) } else { (top, bottom) };
        Self {
            text: text.into(),
            x0,
            top,
            x1,
            bottom,
            height: bottom - top,
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Number of characters in the text, not bytes.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// A line element after adjacent-word fusion.
///
/// Same shape as [`PositionedWord`]; `text` may contain single spaces
/// joining the fused words and `x1` is the right edge of the last one.
pub type MergedSpan = PositionedWord;

/// Mean per-character width over all words with non-empty text.
///
/// Returns `0.0` when no word has text, which disables merging and makes
/// every distinct left edge its own column.
pub fn average_char_width(words: &[PositionedWord]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for word in words {
        let chars = word.char_count();
        if chars == 0 {
            continue;
        }
        sum += word.width() / chars as f64;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
