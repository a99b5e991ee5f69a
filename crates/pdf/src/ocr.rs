//! OCR collaborator boundary.
//!
//! The cloud OCR service returns a loosely typed block list with
//! proportional bounding boxes. [`WordResultSet::from_textract_json`]
//! validates it into typed [`WordBlock`] records once, and
//! [`words_from_blocks`] converts those into absolute
//! [`PositionedWord`]s for the layout engine.

use crate::error::{PdfError, Result};
use crate::extractor::DocumentLocator;
use crate::word::PositionedWord;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Extension of the stored OCR response next to a PDF.
pub const SIDECAR_EXTENSION: &str = "ocr.json";

/// One OCR word with a bounding box proportional to the page size.
#[derive(Debug, Clone, PartialEq)]
pub struct WordBlock {
    pub text: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: Option<f64>,
}

impl WordBlock {
    fn is_valid(&self) -> bool {
        [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// OCR word blocks grouped by 1-based page number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordResultSet {
    pages: BTreeMap<usize, Vec<WordBlock>>,
}

impl WordResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, page: usize, block: WordBlock) {
        self.pages.entry(page).or_default().push(block);
    }

    /// Word blocks of one page, `None` when the page has none.
    pub fn page(&self, page: usize) -> Option<&[WordBlock]> {
        self.pages.get(&page).map(Vec::as_slice)
    }

    pub fn pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.keys().copied()
    }

    pub fn word_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Parse a Textract-style block list.
    ///
    /// Accepts one response object or an array of paginated responses.
    /// Only `WORD` blocks are kept; a missing `Page` means page 1.
    /// Blocks with unusable geometry are dropped with a warning.
    pub fn from_textract_json(json: &str) -> Result<Self> {
        let payload: RawPayload = serde_json::from_str(json)?;
        let responses = match payload {
            RawPayload::Many(responses) => responses,
            RawPayload::One(response) => vec![response],
        };

        let mut result = WordResultSet::new();
        let mut dropped = 0usize;

        for block in responses.into_iter().flat_map(|r| r.blocks) {
            if block.block_type != "WORD" {
                continue;
            }
            let page = block.page.unwrap_or(1);
            let Some(geometry) = block.geometry else {
                dropped += 1;
                continue;
            };
            let bbox = geometry.bounding_box;
            let word = WordBlock {
                text: block.text.unwrap_or_default(),
                left: bbox.left,
                top: bbox.top,
                width: bbox.width,
                height: bbox.height,
                confidence: block.confidence,
            };
            if word.is_valid() {
                result.insert(page, word);
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            tracing::warn!(dropped, "dropped OCR word blocks with invalid geometry");
        }

        Ok(result)
    }

    pub fn from_textract_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_textract_json(&json)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPayload {
    Many(Vec<RawResponse>),
    One(RawResponse),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawResponse {
    #[serde(default)]
    blocks: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawBlock {
    block_type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawGeometry {
    bounding_box: RawBoundingBox,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawBoundingBox {
    width: f64,
    height: f64,
    left: f64,
    top: f64,
}

/// Convert one page of OCR word blocks into absolute positioned words.
///
/// `width` and `height` are the page dimensions in the target coordinate
/// space. Absent input (OCR skipped or failed) yields no words.
pub fn words_from_blocks(
    blocks: Option<&[WordBlock]>,
    width: f64,
    height: f64,
) -> Vec<PositionedWord> {
    let Some(blocks) = blocks else {
        return Vec::new();
    };

    blocks
        .iter()
        .map(|block| {
            let x0 = block.left * width;
            let top = block.top * height;
            let x1 = x0 + block.width * width;
            let bottom = top + block.height * height;
            PositionedWord::new(block.text.clone(), x0, top, x1, bottom)
        })
        .collect()
}

/// True when a page carries no extractable native text.
pub fn needs_ocr(page_text: &str) -> bool {
    page_text.trim().is_empty()
}

/// Runs OCR over a whole document.
///
/// Called at most once per document. `Ok(None)` means no result is
/// available; errors are recovered by the caller.
pub trait OcrService: Send + Sync {
    fn run_ocr(&self, document: &DocumentLocator) -> Result<Option<WordResultSet>>;

    /// Name of this OCR backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Serves OCR results previously stored as Textract JSON.
///
/// With an explicit path every document gets that response; otherwise
/// the `<document>.ocr.json` sidecar is read when present.
#[derive(Debug, Clone, Default)]
pub struct JsonOcrService {
    response_path: Option<PathBuf>,
}

impl JsonOcrService {
    pub fn new(response_path: impl Into<PathBuf>) -> Self {
        Self {
            response_path: Some(response_path.into()),
        }
    }

    pub fn sidecar() -> Self {
        Self::default()
    }
}

impl OcrService for JsonOcrService {
    fn run_ocr(&self, document: &DocumentLocator) -> Result<Option<WordResultSet>> {
        let path = match &self.response_path {
            Some(path) => path.clone(),
            None => {
                let sidecar = document.sidecar_path(SIDECAR_EXTENSION);
                if !sidecar.exists() {
                    tracing::debug!(path = %sidecar.display(), "no OCR sidecar found");
                    return Ok(None);
                }
                sidecar
            }
        };

        let result = WordResultSet::from_textract_file(&path).map_err(|e| {
            PdfError::OcrError(format!("failed to load {}: {}", path.display(), e))
        })?;
        tracing::info!(
            path = %path.display(),
            pages = result.pages().count(),
            words = result.word_count(),
            "loaded OCR response"
        );
        Ok(Some(result))
    }

    fn backend_name(&self) -> &str {
        "textract-json"
    }
}

/// An OCR service that never produces a result.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOcr;

impl OcrService for DisabledOcr {
    fn run_ocr(&self, document: &DocumentLocator) -> Result<Option<WordResultSet>> {
        tracing::debug!(document = %document, "OCR backend disabled");
        Ok(None)
    }

    fn backend_name(&self) -> &str {
        "disabled"
    }
}
