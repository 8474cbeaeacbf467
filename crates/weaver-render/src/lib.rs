//! Offline renderers: the poem illustration and the downloadable PDF.

pub mod document;
mod embedded_font;
pub mod fonts;
pub mod illustration;

pub use document::{DocumentExporter, PDF_FILE_NAME};
pub use fonts::GlyphSource;
pub use illustration::{IMAGE_FILE_NAME, IllustrationRenderer, artwork_file_name, encode_png};
