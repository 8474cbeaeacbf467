//! TrueType embedding for body text that WinAnsi cannot carry.
//!
//! The font is written as a Type0 font with Identity-H encoding. Character
//! codes are the UTF-16 code units of the text, so a CID equals its Basic
//! Multilingual Plane code point. A CIDToGIDMap stream points each CID at its
//! glyph and an identity ToUnicode CMap lets readers recover the text.

use ab_glyph::{Font, FontVec};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::collections::BTreeSet;
use std::path::Path;

use crate::fonts::GlyphSource;

/// Written for characters outside the Basic Multilingual Plane.
const REPLACEMENT: u16 = 0xFFFD;
/// bfrange entries per CMap section.
const CMAP_SECTION_LIMIT: usize = 100;

pub(crate) struct EmbeddedFont {
    name: String,
    font: FontVec,
}

impl EmbeddedFont {
    /// Copies the TrueType font behind `glyphs`. Built-in glyphs and font
    /// collections cannot be embedded.
    pub(crate) fn from_glyphs(glyphs: &GlyphSource) -> Option<Self> {
        let GlyphSource::TrueType { font, origin, .. } = glyphs else {
            return None;
        };
        let data = font.as_slice();
        if data.starts_with(b"ttcf") {
            return None;
        }
        let font = FontVec::try_from_vec(data.to_vec()).ok()?;
        Some(Self {
            name: postscript_name(origin),
            font,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// The two-byte character code written for `c`.
    pub(crate) fn code(c: char) -> u16 {
        match c {
            '\t' => 0x20,
            c => u16::try_from(u32::from(c)).unwrap_or(REPLACEMENT),
        }
    }

    /// Hex string operand for a `Tj` in this font.
    pub(crate) fn encode(text: &str) -> Object {
        let bytes = text
            .chars()
            .flat_map(|c| Self::code(c).to_be_bytes())
            .collect();
        Object::String(bytes, StringFormat::Hexadecimal)
    }

    /// Width of `text` in points at `size`.
    pub(crate) fn text_width(&self, text: &str, size: i64) -> i64 {
        let units: i64 = text.chars().map(|c| self.advance(Self::code(c))).sum();
        (units * size + 999) / 1000
    }

    /// Adds the font objects for the codes in `codes` and returns the id of
    /// the Type0 font dictionary.
    pub(crate) fn add_to(&self, doc: &mut Document, codes: &BTreeSet<u16>) -> ObjectId {
        let ascent = self.to_text_space(self.font.ascent_unscaled());
        let descent = self.to_text_space(self.font.descent_unscaled());

        let data = self.font.as_slice().to_vec();
        let length = data.len() as i64;
        let font_file_id = doc.add_object(
            Stream::new(dictionary! { "Length1" => length }, data).with_compression(false),
        );
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => self.name.clone(),
            "Flags" => 32,
            "FontBBox" => vec![0.into(), descent.into(), 1000.into(), ascent.into()],
            "ItalicAngle" => 0,
            "Ascent" => ascent,
            "Descent" => descent,
            "CapHeight" => ascent,
            "StemV" => 80,
            "FontFile2" => font_file_id,
        });
        let gid_map_id = doc.add_object(
            Stream::new(dictionary! {}, self.cid_to_gid_map(codes)).with_compression(false),
        );
        let descendant_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => self.name.clone(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => 1000,
            "W" => self.widths(codes),
            "CIDToGIDMap" => gid_map_id,
        });
        let to_unicode_id = doc.add_object(
            Stream::new(dictionary! {}, to_unicode_cmap(codes)).with_compression(false),
        );

        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => self.name.clone(),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![descendant_id.into()],
            "ToUnicode" => to_unicode_id,
        })
    }

    fn glyph(&self, code: u16) -> u16 {
        let c = char::from_u32(u32::from(code)).unwrap_or(char::REPLACEMENT_CHARACTER);
        self.font.glyph_id(c).0
    }

    fn advance(&self, code: u16) -> i64 {
        let c = char::from_u32(u32::from(code)).unwrap_or(char::REPLACEMENT_CHARACTER);
        self.to_text_space(self.font.h_advance_unscaled(self.font.glyph_id(c)))
    }

    fn to_text_space(&self, units: f32) -> i64 {
        let units_per_em = self.font.units_per_em().unwrap_or(1000.0);
        (units * 1000.0 / units_per_em).round() as i64
    }

    /// Big-endian glyph ids indexed by CID, up to the highest code used.
    fn cid_to_gid_map(&self, codes: &BTreeSet<u16>) -> Vec<u8> {
        let Some(&last) = codes.last() else {
            return Vec::new();
        };
        let mut map = vec![0u8; (usize::from(last) + 1) * 2];
        for &code in codes {
            let at = usize::from(code) * 2;
            map[at..at + 2].copy_from_slice(&self.glyph(code).to_be_bytes());
        }
        map
    }

    /// `W` array: `cid [width]` for every code used.
    fn widths(&self, codes: &BTreeSet<u16>) -> Vec<Object> {
        codes
            .iter()
            .flat_map(|&code| {
                [
                    Object::from(code),
                    Object::Array(vec![self.advance(code).into()]),
                ]
            })
            .collect()
    }
}

/// Font name usable as a PDF name: the file stem with anything but ASCII
/// letters, digits and `-` removed.
fn postscript_name(origin: &Path) -> String {
    let name: String = origin
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if name.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        name
    }
}

/// Identity ToUnicode CMap covering each 256-code block that holds a used
/// code.
fn to_unicode_cmap(codes: &BTreeSet<u16>) -> Vec<u8> {
    let blocks: BTreeSet<u16> = codes.iter().map(|code| code >> 8).collect();
    let ranges: Vec<String> = blocks
        .iter()
        .map(|block| format!("<{block:02X}00> <{block:02X}FF> <{block:02X}00>"))
        .collect();

    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo <<\n\
         /Registry (Adobe)\n\
         /Ordering (UCS)\n\
         /Supplement 0\n\
         >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );
    for section in ranges.chunks(CMAP_SECTION_LIMIT) {
        cmap.push_str(&format!("{} beginbfrange\n", section.len()));
        for range in section {
            cmap.push_str(range);
            cmap.push('\n');
        }
        cmap.push_str("endbfrange\n");
    }
    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_utf16_units() {
        assert_eq!(EmbeddedFont::code('A'), 0x41);
        assert_eq!(EmbeddedFont::code('\u{0928}'), 0x0928);
        assert_eq!(EmbeddedFont::code('\t'), 0x20);
        assert_eq!(EmbeddedFont::code('\u{1F319}'), REPLACEMENT);
    }

    #[test]
    fn test_encode_writes_big_endian_pairs() {
        let Object::String(bytes, StringFormat::Hexadecimal) = EmbeddedFont::encode("aन") else {
            panic!("expected a hex string");
        };
        assert_eq!(bytes, vec![0x00, 0x61, 0x09, 0x28]);
    }

    #[test]
    fn test_cmap_has_one_range_per_block() {
        let codes: BTreeSet<u16> = [0x0041, 0x0928, 0x0915, 0x2014].into_iter().collect();
        let cmap = String::from_utf8(to_unicode_cmap(&codes)).unwrap();

        assert!(cmap.contains("3 beginbfrange\n"));
        assert!(cmap.contains("<0000> <00FF> <0000>\n"));
        assert!(cmap.contains("<0900> <09FF> <0900>\n"));
        assert!(cmap.contains("<2000> <20FF> <2000>\n"));
        assert!(cmap.ends_with("end\nend\n"));
    }

    #[test]
    fn test_postscript_name_is_sanitized() {
        assert_eq!(postscript_name(Path::new("/fonts/Noto Sans_Deva.ttf")), "NotoSansDeva");
        assert_eq!(postscript_name(Path::new("/fonts/__.ttf")), "EmbeddedFont");
    }

    #[test]
    fn test_builtin_glyphs_cannot_be_embedded() {
        assert!(EmbeddedFont::from_glyphs(&GlyphSource::builtin()).is_none());
    }
}
