//! Illustration reference stored in the session gallery.

/// Caption attached to every rendered illustration.
pub const ARTWORK_CAPTION: &str = "Poem Artwork";

/// An illustration held in memory as raw RGB8 pixels.
///
/// Encoding to PNG or JPEG happens only when the image leaves the session
/// (download or PDF export).
#[derive(Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB8 pixel data, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
    pub caption: String,
}

impl ImageRef {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
            caption: ARTWORK_CAPTION.to_string(),
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }
}

// Pixel buffers are large; keep debug output readable.
impl std::fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRef")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &format_args!("<{} bytes>", self.pixels.len()))
            .field("caption", &self.caption)
            .finish()
    }
}
