//! Best-effort font lookup with a built-in bitmap fallback.
//!
//! TrueType fonts are tried in order (configured paths, then common system
//! locations). When none can be loaded the 8×8 glyphs from `font8x8` are
//! used, so text can always be drawn.

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use font8x8::{BASIC_FONTS, GREEK_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use weaver_core::config::RenderSettings;

/// System locations tried after the configured fonts. `arial.ttf` relative to
/// the working directory comes first.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "arial.ttf",
    "/usr/share/fonts/truetype/msttcorefonts/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Pixel scale applied to the 8×8 built-in glyphs.
const BUILTIN_SCALE: u32 = 2;

/// Drawn for characters the built-in set has no glyph for.
const MISSING_GLYPH: [u8; 8] = [0x7E, 0x42, 0x42, 0x42, 0x42, 0x42, 0x7E, 0x00];

/// Axis-aligned pixel rectangle; drawing outside it is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ClipRect {
    fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// The glyph set text is drawn with.
pub enum GlyphSource {
    TrueType {
        font: FontVec,
        size: f32,
        origin: PathBuf,
    },
    Builtin {
        scale: u32,
    },
}

impl GlyphSource {
    /// The built-in bitmap glyphs. Never fails.
    pub fn builtin() -> Self {
        Self::Builtin {
            scale: BUILTIN_SCALE,
        }
    }

    /// Loads a TrueType/OpenType font file.
    pub fn from_file(path: &Path, size: f32) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        let font = FontVec::try_from_vec(bytes).ok()?;
        Some(Self::TrueType {
            font,
            size,
            origin: path.to_path_buf(),
        })
    }

    /// Resolves the font for the configured settings, falling back to the
    /// built-in glyphs.
    pub fn resolve(settings: &RenderSettings) -> Self {
        if settings.builtin_font_only {
            return Self::builtin();
        }

        let candidates = settings
            .font_paths
            .iter()
            .map(PathBuf::from)
            .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            if let Some(source) = Self::from_file(&path, settings.font_size) {
                tracing::debug!("[GlyphSource] Using font {}", path.display());
                return source;
            }
        }

        tracing::debug!("[GlyphSource] No TrueType font found, using built-in glyphs");
        Self::builtin()
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin { .. })
    }

    /// Distance between consecutive baselines, in pixels.
    pub fn line_height(&self) -> i32 {
        match self {
            Self::TrueType { font, size, .. } => {
                let scaled = font.as_scaled(PxScale::from(*size));
                (scaled.height() + scaled.line_gap()).ceil() as i32
            }
            Self::Builtin { scale } => (8 * scale + 2 * scale) as i32,
        }
    }

    /// Horizontal advance of `text`, in pixels.
    pub fn measure(&self, text: &str) -> i32 {
        match self {
            Self::TrueType { font, size, .. } => {
                let scaled = font.as_scaled(PxScale::from(*size));
                text.chars()
                    .map(|c| scaled.h_advance(scaled.glyph_id(c)))
                    .sum::<f32>()
                    .ceil() as i32
            }
            Self::Builtin { scale } => (text.chars().count() as u32 * 8 * scale) as i32,
        }
    }

    /// Draws one line with its top-left corner at (`x`, `y`).
    pub fn draw_line(
        &self,
        canvas: &mut RgbImage,
        x: i32,
        y: i32,
        text: &str,
        color: Rgb<u8>,
        clip: ClipRect,
    ) {
        match self {
            Self::TrueType { font, size, .. } => {
                draw_truetype(canvas, font, *size, x, y, text, color, clip)
            }
            Self::Builtin { scale } => draw_builtin(canvas, *scale, x, y, text, color, clip),
        }
    }
}

impl std::fmt::Debug for GlyphSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrueType { size, origin, .. } => f
                .debug_struct("TrueType")
                .field("size", size)
                .field("origin", origin)
                .finish(),
            Self::Builtin { scale } => f.debug_struct("Builtin").field("scale", scale).finish(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_truetype(
    canvas: &mut RgbImage,
    font: &FontVec,
    size: f32,
    x: i32,
    y: i32,
    text: &str,
    color: Rgb<u8>,
    clip: ClipRect,
) {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut caret = point(x as f32, y as f32 + scaled.ascent());

    for c in text.chars() {
        let mut glyph = scaled.scaled_glyph(c);
        glyph.position = caret;
        caret.x += scaled.h_advance(glyph.id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i32 + gx as i32;
            let py = bounds.min.y as i32 + gy as i32;
            blend(canvas, px, py, color, coverage, clip);
        });
    }
}

fn draw_builtin(
    canvas: &mut RgbImage,
    scale: u32,
    x: i32,
    y: i32,
    text: &str,
    color: Rgb<u8>,
    clip: ClipRect,
) {
    let cell = (8 * scale) as i32;
    for (column, c) in text.chars().enumerate() {
        let origin_x = x + column as i32 * cell;
        let rows = builtin_glyph(c);
        for (row_index, row) in rows.iter().enumerate() {
            for bit in 0..8i32 {
                if (*row >> bit) & 1 == 0 {
                    continue;
                }
                for dy in 0..scale as i32 {
                    for dx in 0..scale as i32 {
                        let px = origin_x + bit * scale as i32 + dx;
                        let py = y + row_index as i32 * scale as i32 + dy;
                        blend(canvas, px, py, color, 1.0, clip);
                    }
                }
            }
        }
    }
}

fn builtin_glyph(c: char) -> [u8; 8] {
    if c == ' ' {
        return [0; 8];
    }
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| GREEK_FONTS.get(c))
        .unwrap_or(MISSING_GLYPH)
}

fn blend(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, coverage: f32, clip: ClipRect) {
    if !clip.contains(x, y) || x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= canvas.width() || y >= canvas.height() {
        return;
    }

    let coverage = coverage.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x, y);
    for channel in 0..3 {
        let base = pixel.0[channel] as f32;
        let ink = color.0[channel] as f32;
        pixel.0[channel] = (base + (ink - base) * coverage).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: ClipRect = ClipRect {
        left: 0,
        top: 0,
        right: 64,
        bottom: 32,
    };

    #[test]
    fn test_builtin_only_setting_skips_lookup() {
        let settings = RenderSettings {
            builtin_font_only: true,
            ..Default::default()
        };
        assert!(GlyphSource::resolve(&settings).is_builtin());
    }

    #[test]
    fn test_unreadable_font_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("broken.ttf");
        std::fs::write(&bogus, b"not a font").unwrap();

        assert!(GlyphSource::from_file(&bogus, 24.0).is_none());
    }

    #[test]
    fn test_builtin_metrics() {
        let source = GlyphSource::builtin();
        assert_eq!(source.measure("abc"), 48);
        assert_eq!(source.line_height(), 20);
    }

    #[test]
    fn test_builtin_draws_ink_inside_clip_only() {
        let mut canvas = RgbImage::from_pixel(64, 32, Rgb([255, 255, 255]));
        let clip = ClipRect {
            left: 0,
            top: 0,
            right: 16,
            bottom: 32,
        };

        GlyphSource::builtin().draw_line(&mut canvas, 0, 0, "HH", Rgb([0, 0, 0]), clip);

        let inked = |x0: u32, x1: u32| {
            (x0..x1).any(|x| (0..32).any(|y| canvas.get_pixel(x, y).0 == [0, 0, 0]))
        };
        assert!(inked(0, 16));
        assert!(!inked(16, 64));
    }

    #[test]
    fn test_unknown_character_uses_placeholder_box() {
        let mut canvas = RgbImage::from_pixel(64, 32, Rgb([255, 255, 255]));
        GlyphSource::builtin().draw_line(&mut canvas, 0, 0, "\u{0915}", Rgb([0, 0, 0]), FULL);
        assert!(canvas.pixels().any(|p| p.0 == [0, 0, 0]));
    }
}
