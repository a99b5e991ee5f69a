//! Per-document OCR forcing policies.
//!
//! Some document families (scanner output with an invisible or garbled
//! text layer) extract poorly through native text even though every page
//! has some. A policy decides per document whether every page goes
//! through OCR regardless of its native text.

use crate::extractor::DocumentLocator;

pub trait OcrPolicy: Send + Sync {
    fn forces_ocr(&self, document: &DocumentLocator) -> bool;
}

/// Never forces OCR; only pages without native text use it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverForceOcr;

impl OcrPolicy for NeverForceOcr {
    fn forces_ocr(&self, _document: &DocumentLocator) -> bool {
        false
    }
}

/// Forces OCR for every document.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysForceOcr;

impl OcrPolicy for AlwaysForceOcr {
    fn forces_ocr(&self, _document: &DocumentLocator) -> bool {
        true
    }
}

/// Forces OCR when the file name contains any of the patterns,
/// ignoring case.
#[derive(Debug, Clone, Default)]
pub struct FilenameOcrPolicy {
    patterns: Vec<String>,
}

impl FilenameOcrPolicy {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl OcrPolicy for FilenameOcrPolicy {
    fn forces_ocr(&self, document: &DocumentLocator) -> bool {
        let name = document.file_name().to_lowercase();
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }
}

impl<F> OcrPolicy for F
where
    F: Fn(&DocumentLocator) -> bool + Send + Sync,
{
    fn forces_ocr(&self, document: &DocumentLocator) -> bool {
        self(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_policy_matches_case_insensitively() {
        let policy = FilenameOcrPolicy::new(["scan_", "  ", "Fax"]);
        assert_eq!(policy.patterns(), &["scan_".to_string(), "fax".to_string()]);

        assert!(policy.forces_ocr(&DocumentLocator::new("/in/SCAN_0001.pdf")));
        assert!(policy.forces_ocr(&DocumentLocator::new("incoming-fax.pdf")));
        assert!(!policy.forces_ocr(&DocumentLocator::new("statement.pdf")));
    }

    #[test]
    fn test_filename_policy_ignores_directories() {
        let policy = FilenameOcrPolicy::new(["scan"]);
        assert!(!policy.forces_ocr(&DocumentLocator::new("/scans/statement.pdf")));
    }

    #[test]
    fn test_closure_policy() {
        let policy = |doc: &DocumentLocator| doc.file_name().ends_with(".tiff.pdf");
        assert!(policy.forces_ocr(&DocumentLocator::new("a.tiff.pdf")));
        assert!(!NeverForceOcr.forces_ocr(&DocumentLocator::new("a.tiff.pdf")));
        assert!(AlwaysForceOcr.forces_ocr(&DocumentLocator::new("a.pdf")));
    }
}
