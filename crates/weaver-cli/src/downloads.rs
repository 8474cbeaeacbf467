//! Writes poem artefacts to the download directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use weaver_application::{NARRATION_FILE_NAME, WovenPoem};
use weaver_core::agent::AudioClip;
use weaver_core::session::ImageRef;
use weaver_render::{IMAGE_FILE_NAME, PDF_FILE_NAME, artwork_file_name, encode_png};

pub struct Downloads {
    dir: PathBuf,
}

impl Downloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Illustration of the current poem, as `Poem_Image.png`.
    pub fn save_poem_image(&self, image: &ImageRef) -> Result<PathBuf> {
        self.write(IMAGE_FILE_NAME, &encode_png(image)?)
    }

    /// Gallery item `index` (zero-based), as `Artwork_{index + 1}.png`.
    pub fn save_artwork(&self, index: usize, image: &ImageRef) -> Result<PathBuf> {
        self.write(&artwork_file_name(index), &encode_png(image)?)
    }

    pub fn save_document(&self, pdf: &[u8]) -> Result<PathBuf> {
        self.write(PDF_FILE_NAME, pdf)
    }

    pub fn save_narration(&self, clip: &AudioClip) -> Result<PathBuf> {
        self.write(NARRATION_FILE_NAME, &clip.bytes)
    }

    /// Writes every artefact the poem came with.
    pub fn save_woven(&self, woven: &WovenPoem) -> Result<Vec<PathBuf>> {
        let mut written = vec![self.save_poem_image(&woven.image)?];
        if let Some(pdf) = &woven.document {
            written.push(self.save_document(pdf)?);
        }
        if let Some(clip) = &woven.narration {
            written.push(self.save_narration(clip)?);
        }
        Ok(written)
    }

    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("[Downloads] Wrote {}", path.display());
        Ok(path)
    }
}
