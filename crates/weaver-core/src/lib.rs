pub mod agent;
pub mod config;
pub mod error;
pub mod params;
pub mod secret;
pub mod session;

// Re-export common error type
pub use error::WeaverError;
pub use params::{GenerationParameters, ParameterSelection};
pub use session::{ImageRef, Poem, Session};
