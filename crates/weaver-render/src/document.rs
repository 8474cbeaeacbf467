//! PDF export of a poem together with its illustration.
//!
//! Pages are US Letter with 72 pt margins. The layout is a title, the full
//! poem body, a heading and the illustration scaled to 400×300. Content
//! streams are left uncompressed and no creation date is written, so the same
//! input always yields the same bytes.
//!
//! Body text is set in Helvetica when WinAnsi can encode all of it. Otherwise
//! the TrueType font the illustration uses is embedded for the body.

use crate::embedded_font::EmbeddedFont;
use crate::fonts::GlyphSource;
use crate::illustration::to_rgb_image;
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::collections::BTreeSet;
use std::sync::Arc;
use weaver_core::error::ExportError;
use weaver_core::session::ImageRef;

/// Download name for the exported document.
pub const PDF_FILE_NAME: &str = "Poem_With_Image.pdf";

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 72;
const CONTENT_WIDTH: i64 = PAGE_WIDTH - 2 * MARGIN;

const TITLE: &str = "Your Poem";
const TITLE_SIZE: i64 = 18;
const BODY_SIZE: i64 = 10;
const BODY_LEADING: i64 = 12;
const HEADING: &str = "Poem Illustration";
const HEADING_SIZE: i64 = 14;

const IMAGE_WIDTH: i64 = 400;
const IMAGE_HEIGHT: i64 = 300;
const JPEG_QUALITY: u8 = 90;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";
const EMBEDDED: &str = "F3";
const IMAGE_NAME: &str = "Im1";

// Unicode code points for WinAnsi bytes 0x80..=0x9F. Zero marks an unused byte.
const WIN_ANSI_HIGH: [u16; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039,
    0x0152, 0, 0x017D, 0, 0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC, 0x2122,
    0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178,
];

/// Builds the downloadable poem document.
#[derive(Clone, Default)]
pub struct DocumentExporter {
    unicode_font: Option<Arc<EmbeddedFont>>,
}

impl DocumentExporter {
    /// An exporter limited to the standard Helvetica faces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Embeds the TrueType font behind `glyphs` for poems Helvetica cannot
    /// set. Built-in glyphs leave the exporter Helvetica-only.
    pub fn with_glyphs(glyphs: &GlyphSource) -> Self {
        Self {
            unicode_font: EmbeddedFont::from_glyphs(glyphs).map(Arc::new),
        }
    }

    pub fn embeds_fonts(&self) -> bool {
        self.unicode_font.is_some()
    }

    /// Produces the PDF bytes for `poem_text` and its illustration.
    pub fn export(&self, poem_text: &str, image: &ImageRef) -> Result<Vec<u8>, ExportError> {
        let jpeg = encode_jpeg(image)?;
        let body = self.body_font(poem_text);
        let pages = layout(poem_text, &body);
        tracing::debug!(pages = pages.len(), "[DocumentExporter] Laid out document");
        assemble(pages, image, jpeg, &body, poem_text)
    }

    fn body_font(&self, poem_text: &str) -> BodyFont<'_> {
        let encodable = poem_text
            .chars()
            .all(|c| matches!(c, '\n' | '\r') || win_ansi_byte(c).is_some());
        if encodable {
            return BodyFont::Helvetica;
        }
        match &self.unicode_font {
            Some(font) => {
                tracing::debug!("[DocumentExporter] Embedding {} for the poem body", font.name());
                BodyFont::Embedded(font)
            }
            None => {
                tracing::warn!(
                    "[DocumentExporter] No TrueType font to embed; characters outside WinAnsi are written as '?'"
                );
                BodyFont::Helvetica
            }
        }
    }
}

impl std::fmt::Debug for DocumentExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentExporter")
            .field("unicode_font", &self.unicode_font.as_ref().map(|font| font.name()))
            .finish()
    }
}

/// Face used for the poem body.
enum BodyFont<'a> {
    Helvetica,
    Embedded(&'a EmbeddedFont),
}

impl BodyFont<'_> {
    fn resource(&self) -> &'static str {
        match self {
            Self::Helvetica => REGULAR,
            Self::Embedded(_) => EMBEDDED,
        }
    }

    fn width(&self, text: &str, size: i64) -> i64 {
        match self {
            Self::Helvetica => text_width(text, size, false),
            Self::Embedded(font) => font.text_width(text, size),
        }
    }

    fn operand(&self, text: &str) -> Object {
        match self {
            Self::Helvetica => literal(text),
            Self::Embedded(_) => EmbeddedFont::encode(text),
        }
    }
}

fn encode_jpeg(image: &ImageRef) -> Result<Vec<u8>, ExportError> {
    let canvas = to_rgb_image(image)?;
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode_image(&canvas)
        .map_err(|e| ExportError::Pdf(format!("Failed to encode illustration: {e}")))?;
    Ok(bytes)
}

/// Tracks the write position while filling pages top to bottom.
struct PageFlow {
    pages: Vec<Vec<Operation>>,
    cursor: i64,
}

impl PageFlow {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Moves down by `height`, starting a new page if it would cross the
    /// bottom margin. Returns the new baseline.
    fn advance(&mut self, height: i64) -> i64 {
        if self.cursor - height < MARGIN {
            self.break_page();
        }
        self.cursor -= height;
        self.cursor
    }

    fn break_page(&mut self) {
        self.pages.push(Vec::new());
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    fn skip(&mut self, height: i64) {
        self.cursor -= height;
    }

    fn push(&mut self, ops: impl IntoIterator<Item = Operation>) {
        if let Some(page) = self.pages.last_mut() {
            page.extend(ops);
        }
    }

    fn text(&mut self, font: &str, size: i64, x: i64, baseline: i64, operand: Object) {
        self.push([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new("Tj", vec![operand]),
            Operation::new("ET", vec![]),
        ]);
    }
}

fn layout(poem_text: &str, body: &BodyFont<'_>) -> Vec<Vec<Operation>> {
    let mut flow = PageFlow::new();

    let baseline = flow.advance(TITLE_SIZE);
    let title_width = text_width(TITLE, TITLE_SIZE, true);
    let title_x = MARGIN + (CONTENT_WIDTH - title_width) / 2;
    flow.text(BOLD, TITLE_SIZE, title_x, baseline, literal(TITLE));
    flow.skip(12);

    let measure = |line: &str| body.width(line, BODY_SIZE);
    for line in wrap(poem_text, CONTENT_WIDTH, &measure) {
        let baseline = flow.advance(BODY_LEADING);
        if !line.is_empty() {
            flow.text(body.resource(), BODY_SIZE, MARGIN, baseline, body.operand(&line));
        }
    }
    flow.skip(24);

    // Keep the heading on the same page as the picture.
    if flow.cursor - (HEADING_SIZE + 12 + IMAGE_HEIGHT) < MARGIN {
        flow.break_page();
    }
    let baseline = flow.advance(HEADING_SIZE);
    flow.text(BOLD, HEADING_SIZE, MARGIN, baseline, literal(HEADING));
    flow.skip(12);

    let bottom = flow.advance(IMAGE_HEIGHT);
    flow.push([
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                IMAGE_WIDTH.into(),
                0.into(),
                0.into(),
                IMAGE_HEIGHT.into(),
                MARGIN.into(),
                bottom.into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]);

    flow.pages
}

fn assemble(
    pages: Vec<Vec<Operation>>,
    image: &ImageRef,
    jpeg: Vec<u8>,
    body: &BodyFont<'_>,
    poem_text: &str,
) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(image.width),
        "Height" => i64::from(image.height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    let image_id = doc.add_object(Stream::new(image_dict, jpeg).with_compression(false));
    let mut fonts = dictionary! {
        REGULAR => regular_id,
        BOLD => bold_id,
    };
    if let BodyFont::Embedded(font) = body {
        let codes: BTreeSet<u16> = poem_text
            .chars()
            .filter(|c| !matches!(c, '\n' | '\r'))
            .map(EmbeddedFont::code)
            .collect();
        fonts.set(EMBEDDED, font.add_to(&mut doc, &codes));
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => dictionary! {
            IMAGE_NAME => image_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| ExportError::Pdf(format!("Failed to encode page content: {e}")))?;
        let content_id =
            doc.add_object(Stream::new(dictionary! {}, content).with_compression(false));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ExportError::Pdf(format!("Failed to write document: {e}")))?;
    Ok(bytes)
}

/// Breaks `text` into lines whose `measure` fits `max_width` points.
/// Newlines are kept as line breaks; blank lines survive as empty entries.
fn wrap(text: &str, max_width: i64, measure: &dyn Fn(&str) -> i64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();
        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for c in word.chars() {
                current.push(c);
                if measure(&current) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        lines.push(current);
    }
    lines
}

/// Width of `text` in points for the standard Helvetica faces.
fn text_width(text: &str, size: i64, bold: bool) -> i64 {
    let units: i64 = text.chars().map(|c| glyph_width(c, bold)).sum();
    (units * size + 999) / 1000
}

// Advance widths (1/1000 em) for ASCII 0x20..=0x7E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722, 722, 667,
    611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667,
    667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500,
    222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722, 722, 667,
    611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667,
    667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556,
    278, 889, 611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];
const DEFAULT_GLYPH_WIDTH: i64 = 556;

fn glyph_width(c: char, bold: bool) -> i64 {
    let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
    match c as u32 {
        code @ 0x20..=0x7E => i64::from(table[(code - 0x20) as usize]),
        0x2018 | 0x2019 | 0x201A => if bold { 278 } else { 222 },
        0x201C | 0x201D | 0x201E => if bold { 500 } else { 333 },
        0x2014 | 0x2026 | 0x2030 => 1000,
        0x2022 => 350,
        _ => DEFAULT_GLYPH_WIDTH,
    }
}

/// The WinAnsi byte for `c`, if it has one. Tabs are set as spaces.
fn win_ansi_byte(c: char) -> Option<u8> {
    match u32::from(c) {
        code @ (0x20..=0x7E | 0xA0..=0xFF) => Some(code as u8),
        0x09 => Some(b' '),
        code @ 0x100.. => WIN_ANSI_HIGH
            .iter()
            .position(|&mapped| u32::from(mapped) == code)
            .map(|offset| 0x80 + offset as u8),
        _ => None,
    }
}

/// Encodes text for a WinAnsi font. Characters it cannot carry become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(|c| win_ansi_byte(c).unwrap_or(b'?')).collect()
}

fn literal(text: &str) -> Object {
    Object::String(win_ansi(text), StringFormat::Literal)
}
