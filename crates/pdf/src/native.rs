//! Native PDF collaborator backed by `lopdf`.
//!
//! Page text comes from lopdf's own extraction. Table strategies work on
//! a light content-stream walk that yields positioned text fragments and
//! axis-aligned ruling segments in top-down page coordinates. Glyph
//! widths are approximated from the font size.

use crate::detector::TableDetector;
use crate::error::{PdfError, Result};
use crate::extractor::{PageSource, TableStrategy};
use crate::layout::LayoutEngine;
use crate::ruling::{RulingTableFinder, Segment};
use crate::word::{average_char_width, PositionedWord};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use sheetcast_sheet::Grid;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Approximate glyph advance as a fraction of the font size.
const GLYPH_WIDTH_EM: f64 = 0.5;

/// TJ adjustments (thousandths of an em) moving right by at least this
/// much are read as a word space.
const TJ_SPACE_THRESHOLD: f64 = 250.0;

/// Gaps of at least this many average character widths separate cells
/// in layout text.
const LAYOUT_CELL_GAP_CHARS: f64 = 2.0;

/// Page tree levels searched for inherited attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Text fragments and rulings of one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub words: Vec<PositionedWord>,
    pub segments: Vec<Segment>,
}

pub struct LopdfSource {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
    detector: TableDetector,
    ruling: RulingTableFinder,
    layout: LayoutEngine,
    /// Content of the most recently walked page, shared by both table strategies.
    last_content: RefCell<Option<(usize, Rc<PageContent>)>>,
}

impl LopdfSource {
    /// Load a PDF from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            PdfError::ReadError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Load a PDF from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| PdfError::ParseError(format!("Failed to load PDF: {}", e)))?;
        let pages = doc.get_pages();

        tracing::debug!(pages = pages.len(), "loaded PDF");

        Ok(Self {
            doc,
            pages,
            detector: TableDetector::default(),
            ruling: RulingTableFinder::default(),
            layout: LayoutEngine::default(),
            last_content: RefCell::new(None),
        })
    }

    #[must_use]
    pub fn with_detector(mut self, detector: TableDetector) -> Self {
        self.detector = detector;
        self
    }

    #[must_use]
    pub fn with_ruling(mut self, ruling: RulingTableFinder) -> Self {
        self.ruling = ruling;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutEngine) -> Self {
        self.layout = layout;
        self
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        u32::try_from(page)
            .ok()
            .and_then(|n| self.pages.get(&n).copied())
            .ok_or_else(|| {
                PdfError::ExtractionError(format!(
                    "Page {} out of range (document has {} pages)",
                    page,
                    self.pages.len()
                ))
            })
    }

    /// Look up a page attribute, following the page tree for inherited ones.
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = Some(page_id);
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = self.doc.get_dictionary(current?).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        None
    }

    /// MediaBox as `[llx, lly, urx, ury]`.
    fn media_box(&self, page_id: ObjectId) -> [f64; 4] {
        self.inherited_attribute(page_id, b"MediaBox")
            .and_then(|obj| self.number_array(obj))
            .unwrap_or(DEFAULT_MEDIA_BOX)
    }

    /// Page rotation in degrees, normalized to `0..360`.
    fn rotation(&self, page_id: ObjectId) -> i64 {
        self.inherited_attribute(page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0)
            .rem_euclid(360)
    }

    fn number_array(&self, obj: &Object) -> Option<[f64; 4]> {
        let obj = match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok()?,
            other => other,
        };
        let values: Vec<f64> = obj.as_array().ok()?.iter().filter_map(get_number).collect();
        match values.as_slice() {
            [llx, lly, urx, ury] => Some([*llx, *lly, *urx, *ury]),
            _ => None,
        }
    }

    /// Walk the page content stream.
    pub fn page_content(&self, page: usize) -> Result<PageContent> {
        let page_id = self.page_id(page)?;
        let media_box = self.media_box(page_id);

        let data = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| PdfError::ExtractionError(format!("Page {} content: {}", page, e)))?;
        let content = Content::decode(&data)
            .map_err(|e| PdfError::ExtractionError(format!("Page {} content: {}", page, e)))?;
        let fonts = self.doc.get_page_fonts(page_id).unwrap_or_default();

        let mut walker = ContentWalker::new(&self.doc, &fonts, media_box);
        for op in &content.operations {
            walker.apply(&op.operator, &op.operands);
        }

        Ok(walker.finish())
    }

    /// Walk a page once and reuse the result for the next call on the same page.
    fn cached_content(&self, page: usize) -> Result<Rc<PageContent>> {
        if let Some((cached_page, content)) = &*self.last_content.borrow() {
            if *cached_page == page {
                return Ok(Rc::clone(content));
            }
        }

        let content = Rc::new(self.page_content(page)?);
        *self.last_content.borrow_mut() = Some((page, Rc::clone(&content)));
        Ok(content)
    }

    /// Render the page as text lines with wide gaps widened to cell separators.
    fn layout_text(&self, words: &[PositionedWord]) -> String {
        let avg_char_width = average_char_width(words);
        let cell_gap = avg_char_width * LAYOUT_CELL_GAP_CHARS;
        let mut out = String::new();

        for line in self.layout.segment_lines(words) {
            let mut prev_x1: Option<f64> = None;
            for word in &line {
                if let Some(x1) = prev_x1 {
                    if cell_gap > 0.0 && word.x0 - x1 >= cell_gap {
                        out.push_str("  ");
                    } else {
                        out.push(' ');
                    }
                }
                out.push_str(word.text.trim());
                prev_x1 = Some(word.x1);
            }
            out.push('\n');
        }

        out
    }
}

impl PageSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Displayed size: width and height swap on pages rotated a quarter turn.
    fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let page_id = self.page_id(page)?;
        let [llx, lly, urx, ury] = self.media_box(page_id);
        let (width, height) = ((urx - llx).abs(), (ury - lly).abs());
        match self.rotation(page_id) {
            90 | 270 => Ok((height, width)),
            _ => Ok((width, height)),
        }
    }

    fn extract_text(&self, page: usize) -> Result<String> {
        let page_num = u32::try_from(page)
            .map_err(|_| PdfError::ExtractionError(format!("Page {} out of range", page)))?;
        self.doc
            .extract_text(&[page_num])
            .map_err(|e| PdfError::ExtractionError(format!("Page {} text: {}", page, e)))
    }

    fn extract_tables(&self, page: usize, strategy: TableStrategy) -> Result<Vec<Grid>> {
        let content = self.cached_content(page)?;
        let grids = match strategy {
            TableStrategy::Ruled => self.ruling.find_tables(&content.segments, &content.words),
            TableStrategy::TextGap => self
                .detector
                .detect_tables(&self.layout_text(&content.words))
                .into_iter()
                .map(|region| region.rows)
                .collect(),
        };

        tracing::debug!(
            page,
            strategy = %strategy,
            fragments = content.words.len(),
            rulings = content.segments.len(),
            tables = grids.len(),
            "native table extraction"
        );

        Ok(grids)
    }
}

/// Graphics and text state while interpreting one content stream.
struct ContentWalker<'a> {
    doc: &'a Document,
    fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
    media_box: [f64; 4],
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font: Vec<u8>,
    font_size: f64,
    leading: f64,
    current_point: Option<(f64, f64)>,
    subpath_start: Option<(f64, f64)>,
    pending: Vec<Segment>,
    content: PageContent,
}

impl<'a> ContentWalker<'a> {
    fn new(
        doc: &'a Document,
        fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
        media_box: [f64; 4],
    ) -> Self {
        Self {
            doc,
            fonts,
            media_box,
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            current_point: None,
            subpath_start: None,
            pending: Vec::new(),
            content: PageContent::default(),
        }
    }

    fn finish(self) -> PageContent {
        self.content
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        let num = |i: usize| operands.get(i).and_then(get_number);

        match operator {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.ctm_stack.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.ctm = multiply(&m, &self.ctm);
                }
            }

            // Paths
            "m" => {
                if let (Some(x), Some(y)) = (num(0), num(1)) {
                    let point = self.to_page(x, y);
                    self.current_point = Some(point);
                    self.subpath_start = Some(point);
                }
            }
            "l" => {
                if let (Some(x), Some(y)) = (num(0), num(1)) {
                    let point = self.to_page(x, y);
                    if let Some(from) = self.current_point {
                        self.pending.push(Segment::new(from.0, from.1, point.0, point.1));
                    }
                    self.current_point = Some(point);
                }
            }
            "h" => self.close_subpath(),
            "re" => {
                if let (Some(x), Some(y), Some(w), Some(h)) = (num(0), num(1), num(2), num(3)) {
                    let corners = [
                        self.to_page(x, y),
                        self.to_page(x + w, y),
                        self.to_page(x + w, y + h),
                        self.to_page(x, y + h),
                    ];
                    for i in 0..4 {
                        let (a, b) = (corners[i], corners[(i + 1) % 4]);
                        self.pending.push(Segment::new(a.0, a.1, b.0, b.1));
                    }
                    self.current_point = Some(corners[0]);
                    self.subpath_start = Some(corners[0]);
                }
            }
            "S" | "f" | "F" | "f*" | "B" | "B*" => self.commit_path(),
            "s" | "b" | "b*" => {
                self.close_subpath();
                self.commit_path();
            }
            "n" => {
                self.pending.clear();
                self.current_point = None;
            }

            // Text state
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(Ok(name)) = operands.first().map(Object::as_name) {
                    self.font = name.to_vec();
                }
                if let Some(size) = num(1) {
                    self.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = num(0) {
                    self.leading = leading;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),

            // Text showing
            "Tj" => {
                if let Some(text) = operands.first().and_then(|o| self.decode(o)) {
                    self.show(text);
                }
            }
            "'" => {
                self.next_line();
                if let Some(text) = operands.first().and_then(|o| self.decode(o)) {
                    self.show(text);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(text) = operands.get(2).and_then(|o| self.decode(o)) {
                    self.show(text);
                }
            }
            "TJ" => {
                if let Some(Ok(items)) = operands.first().map(Object::as_array) {
                    self.show_array(items);
                }
            }
            _ => {}
        }
    }

    fn to_page(&self, x: f64, y: f64) -> (f64, f64) {
        let (dx, dy) = transform(&self.ctm, x, y);
        (dx - self.media_box[0], self.media_box[3] - dy)
    }

    fn close_subpath(&mut self) {
        if let (Some(from), Some(to)) = (self.current_point, self.subpath_start) {
            if from != to {
                self.pending.push(Segment::new(from.0, from.1, to.0, to.1));
            }
            self.current_point = Some(to);
        }
    }

    fn commit_path(&mut self) {
        self.content.segments.append(&mut self.pending);
        self.current_point = None;
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading == 0.0 {
            self.font_size * 1.2
        } else {
            self.leading
        };
        self.move_line(0.0, -leading);
    }

    fn decode(&self, obj: &Object) -> Option<String> {
        decode_text_operand(obj, self.doc, self.fonts, &self.font)
    }

    fn show_array(&mut self, items: &[Object]) {
        let mut text = String::new();
        let mut advance = 0.0;
        for item in items {
            if let Some(adjust) = get_number(item) {
                if -adjust >= TJ_SPACE_THRESHOLD && !text.ends_with(' ') && !text.is_empty() {
                    text.push(' ');
                }
                advance -= adjust / 1000.0 * self.font_size;
            } else if let Some(part) = self.decode(item) {
                advance += part.chars().count() as f64 * GLYPH_WIDTH_EM * self.font_size;
                text.push_str(&part);
            }
        }
        self.show_with_advance(text, advance);
    }

    fn show(&mut self, text: String) {
        let advance = text.chars().count() as f64 * GLYPH_WIDTH_EM * self.font_size;
        self.show_with_advance(text, advance);
    }

    /// Emit one fragment spanning `advance` text-space units, then move past it.
    fn show_with_advance(&mut self, text: String, advance: f64) {
        if !text.trim().is_empty() {
            let rendering = multiply(&self.text_matrix, &self.ctm);
            let (start_x, start_y) = transform(&rendering, 0.0, 0.0);
            let (end_x, _) = transform(&rendering, advance, 0.0);
            let size = self.font_size * rendering[2].hypot(rendering[3]);

            let x0 = start_x - self.media_box[0];
            let x1 = end_x - self.media_box[0];
            let baseline = self.media_box[3] - start_y;
            self.content.words.push(PositionedWord::new(
                text.trim(),
                x0,
                baseline - size,
                x1,
                baseline,
            ));
        }

        self.text_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, advance, 0.0], &self.text_matrix);
    }
}

/// `m × n` for PDF row-vector matrices.
fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn transform(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (slot, operand) in m.iter_mut().zip(operands) {
        *slot = get_number(operand)?;
    }
    Some(m)
}

fn get_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Decode a string operand with the font's encoding, falling back to
/// UTF-16BE (with BOM) and then Latin-1.
fn decode_text_operand(
    obj: &Object,
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    current_font: &[u8],
) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(font_dict) = fonts.get(current_font) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }

    Some(bytes.iter().map(|&b| b as char).collect())
}
