//! Session domain module.
//!
//! This module contains the per-user session state and the records it keeps.
//!
//! # Module Structure
//!
//! - `model`: The session itself (`Session`)
//! - `poem`: A generated poem with its parameters (`Poem`)
//! - `image`: An in-memory illustration (`ImageRef`)
//!
//! # Usage
//!
//! ```ignore
//! use weaver_core::session::{Session, Poem, ImageRef};
//! ```

mod image;
mod model;
mod poem;

// Re-export public API
pub use image::{ARTWORK_CAPTION, ImageRef};
pub use model::{DEFAULT_IDENTITY, GalleryEntry, Session};
pub use poem::Poem;
