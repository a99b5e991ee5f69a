use crate::error::{PdfError, Result};
use sheetcast_sheet::Grid;
use std::fmt;
use std::path::{Path, PathBuf};

/// Native table detection strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStrategy {
    /// Tables outlined by ruling lines drawn on the page.
    Ruled,
    /// Tables inferred from whitespace alignment, no rulings required.
    TextGap,
}

impl TableStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            TableStrategy::Ruled => "ruled",
            TableStrategy::TextGap => "text-gap",
        }
    }
}

impl fmt::Display for TableStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the document being converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLocator {
    path: PathBuf,
}

impl DocumentLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, or the whole path when it has none.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    /// `<path>.<extension>` next to the document.
    pub fn sidecar_path(&self, extension: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }
}

impl fmt::Display for DocumentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Per-page native text and table extraction.
///
/// Page numbers are 1-based.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Page width and height in the coordinate space OCR words are mapped to.
    fn page_size(&self, page: usize) -> Result<(f64, f64)>;

    fn extract_text(&self, page: usize) -> Result<String>;

    fn extract_tables(&self, page: usize, strategy: TableStrategy) -> Result<Vec<Grid>>;
}

/// Resolve an optional 1-based inclusive page range against a page count.
pub fn resolve_page_range(
    page_range: Option<(usize, usize)>,
    total_pages: usize,
) -> Result<std::ops::RangeInclusive<usize>> {
    let Some((s, e)) = page_range else {
        return Ok(1..=total_pages);
    };

    if s == 0 || e == 0 {
        return Err(PdfError::InvalidPageRange(
            "Page numbers must be >= 1".to_string(),
        ));
    }
    if s > e {
        return Err(PdfError::InvalidPageRange(format!(
            "Start page {} is greater than end page {}",
            s, e
        )));
    }
    let clamped_end = e.min(total_pages);
    if s > clamped_end {
        return Err(PdfError::InvalidPageRange(format!(
            "Start page {} exceeds document length of {} pages",
            s, total_pages
        )));
    }

    Ok(s..=clamped_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_range() {
        assert_eq!(resolve_page_range(None, 3).unwrap(), 1..=3);
        assert!(resolve_page_range(None, 0).unwrap().is_empty());
    }

    #[test]
    fn test_range_clamped() {
        assert_eq!(resolve_page_range(Some((2, 10)), 4).unwrap(), 2..=4);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(matches!(
            resolve_page_range(Some((0, 2)), 4),
            Err(PdfError::InvalidPageRange(_))
        ));
        assert!(matches!(
            resolve_page_range(Some((3, 2)), 4),
            Err(PdfError::InvalidPageRange(_))
        ));
        assert!(matches!(
            resolve_page_range(Some((5, 6)), 4),
            Err(PdfError::InvalidPageRange(_))
        ));
    }

    #[test]
    fn test_locator_names() {
        let doc = DocumentLocator::new("/tmp/in/Scan_Statement.pdf");
        assert_eq!(doc.file_name(), "Scan_Statement.pdf");
        assert_eq!(
            doc.sidecar_path("ocr.json"),
            PathBuf::from("/tmp/in/Scan_Statement.pdf.ocr.json")
        );
    }
}
