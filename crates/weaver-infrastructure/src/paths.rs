//! Unified path management for weaver configuration files.
//!
//! ```text
//! ~/.config/weaver/            # Config directory
//! ├── config.toml              # Application configuration
//! ├── secret.json              # API keys
//! └── logs/                    # Application logs
//!     └── weaver.log.YYYY-MM-DD
//! ```
//!
//! A base directory can be injected for tests; otherwise the platform config
//! directory from `dirs` is used.

use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "weaver";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home/config directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves every file Weaver reads or writes outside the output directory.
#[derive(Debug, Clone, Default)]
pub struct WeaverPaths {
    base: Option<PathBuf>,
}

impl WeaverPaths {
    /// Creates a resolver. `base` replaces the platform config directory.
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the weaver configuration directory (e.g. `~/.config/weaver/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to config.toml.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to secret.json.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    /// Returns the path to the logs directory.
    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}
