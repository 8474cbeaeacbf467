//! Placeholder illustration for a poem.
//!
//! A fixed 800×600 canvas: pale blue background, a bordered white panel and
//! the opening of the poem drawn on it. Pure and offline; the same text and
//! the same glyph source always produce the same pixels.

use crate::fonts::{ClipRect, GlyphSource};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use weaver_core::config::RenderSettings;
use weaver_core::error::ExportError;
use weaver_core::session::ImageRef;

pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 600;
/// Characters of the poem that make it onto the canvas.
pub const SNIPPET_CHARS: usize = 200;
/// Download name for the illustration of the current poem.
pub const IMAGE_FILE_NAME: &str = "Poem_Image.png";

const BACKGROUND: Rgb<u8> = Rgb([0xc9, 0xd6, 0xff]);
const PANEL_FILL: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
const PANEL_BORDER: Rgb<u8> = Rgb([0x22, 0x22, 0x22]);
const TEXT_COLOR: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);

// Panel corners, inclusive.
const PANEL_LEFT: u32 = 50;
const PANEL_TOP: u32 = 50;
const PANEL_RIGHT: u32 = 750;
const PANEL_BOTTOM: u32 = 550;
const BORDER_WIDTH: u32 = 2;

const TEXT_X: i32 = 60;
const TEXT_Y: i32 = 100;

/// Draws poem illustrations with one resolved glyph source.
#[derive(Debug)]
pub struct IllustrationRenderer {
    glyphs: GlyphSource,
}

impl IllustrationRenderer {
    pub fn new(glyphs: GlyphSource) -> Self {
        Self { glyphs }
    }

    /// Resolves the font once; every later render reuses it.
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new(GlyphSource::resolve(settings))
    }

    pub fn glyphs(&self) -> &GlyphSource {
        &self.glyphs
    }

    /// Renders the illustration for `poem_text`. Cannot fail.
    pub fn render(&self, poem_text: &str) -> ImageRef {
        let canvas = self.render_canvas(poem_text);
        let (width, height) = canvas.dimensions();
        ImageRef::new(width, height, canvas.into_raw())
    }

    pub fn render_canvas(&self, poem_text: &str) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, BACKGROUND);
        draw_panel(&mut canvas);

        let clip = ClipRect {
            left: (PANEL_LEFT + BORDER_WIDTH) as i32,
            top: (PANEL_TOP + BORDER_WIDTH) as i32,
            right: (PANEL_RIGHT + 1 - BORDER_WIDTH) as i32,
            bottom: (PANEL_BOTTOM + 1 - BORDER_WIDTH) as i32,
        };
        let max_width = clip.right - TEXT_X - (TEXT_X - clip.left);
        let line_height = self.glyphs.line_height();

        let text = snippet(poem_text);
        let mut y = TEXT_Y;
        for line in self.wrap(&text, max_width) {
            if y >= clip.bottom {
                break;
            }
            self.glyphs
                .draw_line(&mut canvas, TEXT_X, y, &line, TEXT_COLOR, clip);
            y += line_height;
        }

        canvas
    }

    /// Splits the snippet into lines: on newlines first, then greedily on
    /// spaces so each line fits `max_width`. Words wider than a line are
    /// broken between characters.
    fn wrap(&self, text: &str, max_width: i32) -> Vec<String> {
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
                if self.glyphs.measure(&candidate) <= max_width {
                    current = candidate;
                    continue;
                }
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                for c in word.chars() {
                    current.push(c);
                    if self.glyphs.measure(&current) > max_width && current.chars().count() > 1 {
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
}

/// The part of the poem drawn on the canvas: its first 200 characters.
pub fn snippet(poem_text: &str) -> String {
    poem_text.chars().take(SNIPPET_CHARS).collect()
}

fn draw_panel(canvas: &mut RgbImage) {
    for y in PANEL_TOP..=PANEL_BOTTOM {
        for x in PANEL_LEFT..=PANEL_RIGHT {
            let on_border = x < PANEL_LEFT + BORDER_WIDTH
                || x > PANEL_RIGHT - BORDER_WIDTH
                || y < PANEL_TOP + BORDER_WIDTH
                || y > PANEL_BOTTOM - BORDER_WIDTH;
            let color = if on_border { PANEL_BORDER } else { PANEL_FILL };
            canvas.put_pixel(x, y, color);
        }
    }
}

/// Rebuilds an image buffer from a stored illustration.
pub fn to_rgb_image(image: &ImageRef) -> Result<RgbImage, ExportError> {
    RgbImage::from_raw(image.width, image.height, image.pixels.clone()).ok_or_else(|| {
        ExportError::Image(format!(
            "pixel buffer of {} bytes does not match {}x{}",
            image.pixels.len(),
            image.width,
            image.height
        ))
    })
}

/// Encodes a stored illustration as PNG for download.
pub fn encode_png(image: &ImageRef) -> Result<Vec<u8>, ExportError> {
    let canvas = to_rgb_image(image)?;
    let mut buffer = Cursor::new(Vec::new());
    canvas
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| ExportError::Image(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// File name for the n-th gallery item (zero-based index).
pub fn artwork_file_name(index: usize) -> String {
    format!("Artwork_{}.png", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> IllustrationRenderer {
        IllustrationRenderer::new(GlyphSource::builtin())
    }

    #[test]
    fn test_canvas_layout() {
        let canvas = renderer().render_canvas("");
        assert_eq!(canvas.dimensions(), (800, 600));
        assert_eq!(*canvas.get_pixel(10, 10), BACKGROUND);
        assert_eq!(*canvas.get_pixel(50, 300), PANEL_BORDER);
        assert_eq!(*canvas.get_pixel(751, 300), BACKGROUND);
        assert_eq!(*canvas.get_pixel(400, 80), PANEL_FILL);
    }

    #[test]
    fn test_snippet_counts_characters_not_bytes() {
        let text = "é".repeat(250);
        let cut = snippet(&text);
        assert_eq!(cut.chars().count(), 200);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = renderer();
        let poem = "The lantern sways\nover the harbour wall";
        assert_eq!(renderer.render(poem), renderer.render(poem));
        assert_ne!(renderer.render(poem), renderer.render("Something else"));
    }

    #[test]
    fn test_only_first_200_characters_are_drawn() {
        let head = "word ".repeat(40);
        assert_eq!(head.chars().count(), 200);

        let renderer = renderer();
        let a = renderer.render(&format!("{head}first ending"));
        let b = renderer.render(&format!("{head}a different ending entirely"));
        assert_eq!(a, b);
        assert_eq!(a, renderer.render(&head));
    }

    #[test]
    fn test_wrap_respects_newlines_and_width() {
        let renderer = renderer();
        let lines = renderer.wrap("one two\nthree", 1000);
        assert_eq!(lines, vec!["one two", "three"]);

        // 16 px per built-in glyph: "aaaa bbbb" needs 144 px.
        let lines = renderer.wrap("aaaa bbbb", 100);
        assert_eq!(lines, vec!["aaaa", "bbbb"]);

        let lines = renderer.wrap("abcdefghij", 64);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_png_encoding_round_trips_dimensions() {
        let image = renderer().render("Moon over water");
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 800);
        assert_eq!(decoded.height(), 600);
    }

    #[test]
    fn test_mismatched_buffer_is_an_export_error() {
        let broken = ImageRef::new(10, 10, vec![0; 3]);
        assert!(matches!(encode_png(&broken), Err(ExportError::Image(_))));
    }

    #[test]
    fn test_artwork_file_names_are_one_based() {
        assert_eq!(artwork_file_name(0), "Artwork_1.png");
        assert_eq!(artwork_file_name(4), "Artwork_5.png");
    }
}
