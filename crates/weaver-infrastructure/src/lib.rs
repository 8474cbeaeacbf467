pub mod config_service;
pub mod paths;
pub mod secret_service;

pub use crate::config_service::ConfigService;
pub use crate::paths::WeaverPaths;
pub use crate::secret_service::{GEMINI_API_KEY_ENV, SecretServiceImpl};
