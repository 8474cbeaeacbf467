//! Session domain model.
//!
//! A session lives for one user's interaction with the studio. Nothing is
//! persisted; the caller owns the value and passes it by reference to every
//! operation.

use super::image::ImageRef;
use super::poem::Poem;

/// Identity used until the user gives a name.
pub const DEFAULT_IDENTITY: &str = "Guest";

/// Per-user session state.
///
/// A session contains:
/// - The user's identity (display name)
/// - The last prompt the user submitted
/// - Generated poems, oldest first
/// - Generated illustrations, index-aligned with the poems
///
/// The two histories are private so they can only grow together through
/// [`Session::record`].
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    identity: String,
    last_prompt: String,
    poem_history: Vec<Poem>,
    image_history: Vec<ImageRef>,
}

/// One gallery item: a poem and the illustration rendered from it.
#[derive(Debug, Clone, Copy)]
pub struct GalleryEntry<'a> {
    /// Zero-based position in the history.
    pub index: usize,
    pub poem: &'a Poem,
    pub image: &'a ImageRef,
}

impl Session {
    /// Starts a session for the default guest identity.
    pub fn new() -> Self {
        Self::with_identity(DEFAULT_IDENTITY)
    }

    pub fn with_identity(identity: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            identity: identity.into(),
            last_prompt: String::new(),
            poem_history: Vec::new(),
            image_history: Vec::new(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Renames the user. A blank name falls back to the guest identity.
    pub fn set_identity(&mut self, identity: impl Into<String>) {
        let identity = identity.into();
        let trimmed = identity.trim();
        self.identity = if trimmed.is_empty() {
            DEFAULT_IDENTITY.to_string()
        } else {
            trimmed.to_string()
        };
    }

    pub fn last_prompt(&self) -> &str {
        &self.last_prompt
    }

    pub fn set_last_prompt(&mut self, prompt: impl Into<String>) {
        self.last_prompt = prompt.into();
    }

    pub fn poem_history(&self) -> &[Poem] {
        &self.poem_history
    }

    pub fn image_history(&self) -> &[ImageRef] {
        &self.image_history
    }

    pub fn len(&self) -> usize {
        self.poem_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poem_history.is_empty()
    }

    /// Appends a poem and its illustration as one step.
    ///
    /// Returns the index both entries were stored at.
    pub fn record(&mut self, poem: Poem, image: ImageRef) -> usize {
        debug_assert_eq!(self.poem_history.len(), self.image_history.len());
        self.poem_history.push(poem);
        self.image_history.push(image);
        self.poem_history.len() - 1
    }

    /// Looks up one gallery item by zero-based index.
    pub fn entry(&self, index: usize) -> Option<GalleryEntry<'_>> {
        let poem = self.poem_history.get(index)?;
        let image = self.image_history.get(index)?;
        Some(GalleryEntry { index, poem, image })
    }

    /// Iterates the gallery, oldest first.
    pub fn gallery(&self) -> impl Iterator<Item = GalleryEntry<'_>> {
        self.poem_history
            .iter()
            .zip(self.image_history.iter())
            .enumerate()
            .map(|(index, (poem, image))| GalleryEntry { index, poem, image })
    }

    /// Empties both histories and the last prompt. Identity is kept.
    pub fn clear(&mut self) {
        self.poem_history.clear();
        self.image_history.clear();
        self.last_prompt.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GenerationParameters;

    fn sample_entry(text: &str) -> (Poem, ImageRef) {
        (
            Poem::new(text, GenerationParameters::default(), "prompt"),
            ImageRef::new(1, 1, vec![0, 0, 0]),
        )
    }

    #[test]
    fn test_new_session_is_guest_and_empty() {
        let session = Session::new();
        assert_eq!(session.identity(), "Guest");
        assert_eq!(session.last_prompt(), "");
        assert!(session.is_empty());
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_record_keeps_histories_aligned() {
        let mut session = Session::new();
        let (poem, image) = sample_entry("first");
        assert_eq!(session.record(poem, image), 0);
        let (poem, image) = sample_entry("second");
        assert_eq!(session.record(poem, image), 1);

        assert_eq!(session.poem_history().len(), 2);
        assert_eq!(session.image_history().len(), 2);
        let entry = session.entry(1).unwrap();
        assert_eq!(entry.poem.text, "second");
        assert_eq!(session.gallery().count(), 2);
    }

    #[test]
    fn test_clear_resets_histories_but_keeps_identity() {
        let mut session = Session::with_identity("Akshita");
        session.set_last_prompt("moonlight");
        for text in ["one", "two", "three"] {
            let (poem, image) = sample_entry(text);
            session.record(poem, image);
        }

        session.clear();

        assert!(session.poem_history().is_empty());
        assert!(session.image_history().is_empty());
        assert_eq!(session.last_prompt(), "");
        assert_eq!(session.identity(), "Akshita");
    }

    #[test]
    fn test_blank_identity_falls_back_to_guest() {
        let mut session = Session::with_identity("Ana");
        session.set_identity("   ");
        assert_eq!(session.identity(), DEFAULT_IDENTITY);
    }
}
