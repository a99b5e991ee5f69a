//! Per-document conversion: picks an extraction strategy for every page
//! and collects the results into one workbook.
//!
//! The workbook always starts with the full-text fallback sheet, so it
//! is never empty. Then, page by page in order:
//!
//! - pages without native text, or every page of a document the OCR
//!   policy forces, get one grid reconstructed from OCR words;
//! - other pages get one sheet per ruled table, or per text-aligned
//!   table when no ruled table was found.
//!
//! OCR runs at most once per document. When it fails, a marker sheet
//! records the reason and the remaining pages still convert natively.

use crate::error::{PdfError, Result};
use crate::extractor::{resolve_page_range, DocumentLocator, PageSource, TableStrategy};
use crate::layout::{LayoutEngine, LayoutParams};
use crate::ocr::{needs_ocr, words_from_blocks, OcrService, WordResultSet};
use crate::policy::{NeverForceOcr, OcrPolicy};
use sheetcast_sheet::{Grid, Sheet, Workbook};

pub const FALLBACK_SHEET_NAME: &str = "Full Text";
pub const OCR_MARKER_SHEET_NAME: &str = "OCR Unavailable";

pub fn table_sheet_name(page: usize, table: usize) -> String {
    format!("Page {} Table {}", page, table)
}

pub fn ocr_sheet_name(page: usize) -> String {
    format!("Page {} OCR", page)
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// 1-based inclusive page range; all pages when `None`.
    pub page_range: Option<(usize, usize)>,
    pub ocr_enabled: bool,
    pub min_table_rows: usize,
    pub min_table_cols: usize,
    /// Points within which ruling lines snap together and join.
    pub ruling_tolerance: f64,
    pub layout: LayoutParams,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            page_range: None,
            ocr_enabled: true,
            min_table_rows: 2,
            min_table_cols: 2,
            ruling_tolerance: 3.0,
            layout: LayoutParams::default(),
        }
    }
}

/// Outcome of the single OCR call for a document.
enum OcrOutcome {
    NotRequested,
    Available(WordResultSet),
    Unavailable,
}

pub struct Converter {
    options: ConvertOptions,
    layout: LayoutEngine,
    ocr: Option<Box<dyn OcrService>>,
    policy: Box<dyn OcrPolicy>,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        let layout = LayoutEngine::new(options.layout);
        Self {
            options,
            layout,
            ocr: None,
            policy: Box::new(NeverForceOcr),
        }
    }

    #[must_use]
    pub fn with_ocr(mut self, ocr: impl OcrService + 'static) -> Self {
        self.ocr = Some(Box::new(ocr));
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: impl OcrPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert one document into a workbook.
    ///
    /// Only an invalid page range escapes as an error; page-level and OCR
    /// failures are logged and recovered.
    pub fn convert(&self, source: &dyn PageSource, document: &DocumentLocator) -> Result<Workbook> {
        let pages: Vec<usize> = resolve_page_range(self.options.page_range, source.page_count())?.collect();
        tracing::info!(document = %document, pages = pages.len(), "converting document");

        let texts: Vec<String> = pages
            .iter()
            .map(|&page| {
                source.extract_text(page).unwrap_or_else(|e| {
                    tracing::warn!(page, error = %e, "native text extraction failed");
                    String::new()
                })
            })
            .collect();

        let mut workbook = Workbook::new();
        workbook.push(fallback_sheet(&texts))?;

        let forced = self.policy.forces_ocr(document);
        if forced {
            tracing::info!(document = %document, "OCR forced for every page by policy");
        }
        let ocr_eligible: Vec<bool> = texts.iter().map(|text| forced || needs_ocr(text)).collect();

        let ocr = if ocr_eligible.iter().any(|&eligible| eligible) {
            self.run_ocr(document, &mut workbook)?
        } else {
            OcrOutcome::NotRequested
        };

        for ((&page, text), &eligible) in pages.iter().zip(&texts).zip(&ocr_eligible) {
            if eligible {
                match &ocr {
                    OcrOutcome::Available(result) => {
                        self.ocr_page(source, page, result, &mut workbook)?;
                        continue;
                    }
                    OcrOutcome::NotRequested | OcrOutcome::Unavailable => {
                        if needs_ocr(text) {
                            tracing::info!(
                                page,
                                strategy = "ocr",
                                "page has no native text and no OCR data, no table sheet"
                            );
                            continue;
                        }
                        tracing::info!(page, "OCR unavailable, using native extraction");
                    }
                }
            }

            self.native_page(source, page, &mut workbook)?;
        }

        tracing::info!(
            document = %document,
            sheets = workbook.len(),
            "conversion finished"
        );
        Ok(workbook)
    }

    fn run_ocr(&self, document: &DocumentLocator, workbook: &mut Workbook) -> Result<OcrOutcome> {
        if !self.options.ocr_enabled {
            tracing::info!(document = %document, "OCR disabled, skipping OCR-eligible pages");
            return Ok(OcrOutcome::NotRequested);
        }
        let Some(service) = &self.ocr else {
            tracing::info!(document = %document, "no OCR service configured");
            return Ok(OcrOutcome::NotRequested);
        };

        let reason = match service.run_ocr(document) {
            Ok(Some(result)) => {
                tracing::debug!(
                    backend = service.backend_name(),
                    words = result.word_count(),
                    "OCR result received"
                );
                return Ok(OcrOutcome::Available(result));
            }
            Ok(None) => "OCR returned no result".to_string(),
            Err(e) => e.to_string(),
        };

        tracing::warn!(
            document = %document,
            backend = service.backend_name(),
            reason = %reason,
            "OCR unavailable, continuing with native extraction"
        );
        workbook.push(Sheet::from_rows(
            OCR_MARKER_SHEET_NAME,
            &[vec!["OCR was not available for this document".to_string()], vec![reason]],
        ))?;
        Ok(OcrOutcome::Unavailable)
    }

    fn ocr_page(
        &self,
        source: &dyn PageSource,
        page: usize,
        result: &WordResultSet,
        workbook: &mut Workbook,
    ) -> Result<()> {
        let Some(blocks) = result.page(page) else {
            tracing::info!(page, strategy = "ocr", "no OCR words for page, no table sheet");
            return Ok(());
        };

        let (width, height) = match source.page_size(page) {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!(page, error = %e, "page size unavailable, skipping OCR page");
                return Ok(());
            }
        };

        let words = words_from_blocks(Some(blocks), width, height);
        let grid = self.layout.reconstruct(&words);
        tracing::debug!(page, strategy = "ocr", rows = grid.len(), "OCR grid assembled");

        push_sheet(workbook, Sheet::new(&ocr_sheet_name(page), grid))
    }

    fn native_page(&self, source: &dyn PageSource, page: usize, workbook: &mut Workbook) -> Result<()> {
        for strategy in [TableStrategy::Ruled, TableStrategy::TextGap] {
            let tables = extract_tables(source, page, strategy);
            if tables.is_empty() {
                continue;
            }

            tracing::debug!(page, strategy = %strategy, tables = tables.len(), "tables found");
            for (index, grid) in tables.into_iter().enumerate() {
                push_sheet(workbook, Sheet::new(&table_sheet_name(page, index + 1), grid))?;
            }
            return Ok(());
        }

        tracing::info!(page, "no tables found, page covered by fallback sheet only");
        Ok(())
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

fn extract_tables(source: &dyn PageSource, page: usize, strategy: TableStrategy) -> Vec<Grid> {
    match source.extract_tables(page, strategy) {
        Ok(tables) => tables,
        Err(e) => {
            tracing::warn!(page, strategy = %strategy, error = %e, "table extraction failed");
            Vec::new()
        }
    }
}

/// Sheet names derive from unique page/table indices, so a collision
/// means the same page was processed twice.
fn push_sheet(workbook: &mut Workbook, sheet: Sheet) -> Result<()> {
    workbook.push(sheet).map_err(PdfError::from)
}

/// One column, one row per line of the page texts joined in page order.
fn fallback_sheet(texts: &[String]) -> Sheet {
    let joined = texts.join("\n");
    let grid: Grid = joined.split('\n').map(|line| vec![line.trim_end_matches('\r').to_string()]).collect();
    Sheet::new(FALLBACK_SHEET_NAME, grid)
}
