//! Configuration service implementation.
//!
//! Loads the root configuration from config.toml, writing a default file on
//! first use so users have something to edit.

use crate::paths::WeaverPaths;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use weaver_core::config::RootConfig;
use weaver_core::error::{Result, WeaverError};

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: WeaverPaths,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    pub fn new(paths: WeaverPaths) -> Self {
        Self {
            paths,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the root configuration, loading from file if not cached.
    ///
    /// Load failures are logged and replaced by the defaults; a broken config
    /// file should not keep the studio from starting.
    pub fn get_config(&self) -> RootConfig {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load_config().unwrap_or_else(|err| {
            tracing::warn!("[ConfigService] Using default configuration: {}", err);
            RootConfig::default()
        });

        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(loaded.clone());
        loaded
    }

    /// Reads config.toml, creating it with defaults when it does not exist.
    pub fn load_config(&self) -> Result<RootConfig> {
        let config_path = self.config_path()?;

        if !config_path.exists() {
            let default_config = RootConfig::default();
            self.save_config(&default_config)?;
            tracing::info!(
                "[ConfigService] Created default configuration at {}",
                config_path.display()
            );
            return Ok(default_config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Writes the configuration and refreshes the cache.
    pub fn save_config(&self, config: &RootConfig) -> Result<()> {
        let config_path = self.config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, toml::to_string_pretty(config)?)?;

        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(config.clone());
        Ok(())
    }

    fn config_path(&self) -> Result<PathBuf> {
        self.paths
            .config_file()
            .map_err(|e| WeaverError::config(e.to_string()))
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new(WeaverPaths::default())
    }
}
