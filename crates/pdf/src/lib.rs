//! PDF to workbook conversion.
//!
//! Every document becomes a [`Workbook`] whose first sheet holds the full
//! page text, followed by one sheet per table found. Pages with a text
//! layer are searched for ruled tables first, then for text-aligned ones.
//! Pages without text (scans) are rebuilt into a grid from OCR word
//! boxes by the [`LayoutEngine`].
//!
//! ```no_run
//! use sheetcast_pdf::{convert_pdf, ConvertOptions};
//!
//! let workbook = convert_pdf("statement.pdf", &ConvertOptions::default())?;
//! workbook.save_as_xlsx("statement.xlsx")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod convert;
pub mod detector;
pub mod error;
pub mod extractor;
pub mod layout;
pub mod native;
pub mod ocr;
pub mod policy;
pub mod ruling;
pub mod word;

use std::path::Path;

pub use convert::{ConvertOptions, Converter, FALLBACK_SHEET_NAME, OCR_MARKER_SHEET_NAME};
pub use detector::TableDetector;
pub use error::{PdfError, Result};
pub use extractor::{DocumentLocator, PageSource, TableStrategy};
pub use layout::{LayoutEngine, LayoutParams};
pub use native::LopdfSource;
pub use ruling::RulingTableFinder;
pub use ocr::{DisabledOcr, JsonOcrService, OcrService, WordBlock, WordResultSet};
pub use policy::{AlwaysForceOcr, FilenameOcrPolicy, NeverForceOcr, OcrPolicy};
pub use sheetcast_sheet::Workbook;
pub use word::PositionedWord;

/// Open a PDF with `lopdf` and convert it.
///
/// OCR words are read from a `<file>.ocr.json` sidecar next to the PDF
/// when one exists.
pub fn convert_pdf<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<Workbook> {
    let converter = Converter::new(options.clone()).with_ocr(JsonOcrService::sidecar());
    convert_pdf_with(path, &converter)
}

/// Open a PDF with `lopdf` and convert it with a configured [`Converter`].
pub fn convert_pdf_with<P: AsRef<Path>>(path: P, converter: &Converter) -> Result<Workbook> {
    let path = path.as_ref();
    let source = open_source(path, converter.options())?;
    converter.convert(&source, &DocumentLocator::new(path))
}

/// Load a PDF as a page source tuned by the conversion options.
pub fn open_source(path: &Path, options: &ConvertOptions) -> Result<LopdfSource> {
    Ok(LopdfSource::open(path)?
        .with_detector(TableDetector::new(options.min_table_rows, options.min_table_cols))
        .with_ruling(RulingTableFinder::new(
            options.ruling_tolerance,
            options.ruling_tolerance,
        ))
        .with_layout(LayoutEngine::new(options.layout)))
}
