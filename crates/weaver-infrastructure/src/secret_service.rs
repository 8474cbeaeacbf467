//! Secret service implementation.
//!
//! Reads the Gemini API key from secret.json. The `GEMINI_API_KEY`
//! environment variable, when set, takes precedence over the file.

use crate::paths::WeaverPaths;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use weaver_core::config::{DEFAULT_GEMINI_MODEL, GeminiConfig, SecretConfig};
use weaver_core::secret::SecretService;

/// Environment variable that overrides the stored API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Service for managing secret configuration.
///
/// The parsed file is cached to avoid repeated file I/O.
#[derive(Clone)]
pub struct SecretServiceImpl {
    file_path: PathBuf,
    secrets: Arc<RwLock<Option<SecretConfig>>>,
    env_override: Option<String>,
}

impl SecretServiceImpl {
    /// Creates a service for the secret file resolved by `paths`.
    ///
    /// The environment override is captured once, here.
    pub fn new(paths: &WeaverPaths) -> Result<Self> {
        let file_path = paths
            .secret_file()
            .map_err(|e| anyhow::anyhow!("Failed to get secret path: {}", e))?;
        let env_override = std::env::var(GEMINI_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            file_path,
            secrets: Arc::new(RwLock::new(None)),
            env_override,
        })
    }

    /// Replaces the captured environment override.
    pub fn with_env_override(mut self, api_key: Option<String>) -> Self {
        self.env_override = api_key;
        self
    }

    /// Ensures the secret file exists, creating a template if it doesn't.
    ///
    /// # Security Note
    ///
    /// Sets file permissions to 600 (user read/write only) on Unix systems.
    pub fn ensure_secret_file(&self) -> Result<PathBuf> {
        if self.file_path.exists() {
            return Ok(self.file_path.clone());
        }

        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let template_config = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: String::new(),
                model_name: Some(DEFAULT_GEMINI_MODEL.to_string()),
            }),
        };
        let template_json = serde_json::to_string_pretty(&template_config)?;
        std::fs::write(&self.file_path, template_json)
            .with_context(|| format!("Failed to write {}", self.file_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.file_path, permissions)?;
        }

        tracing::info!(
            "[SecretService] Created secret template at {}",
            self.file_path.display()
        );
        Ok(self.file_path.clone())
    }

    fn load_file(&self) -> Result<SecretConfig, String> {
        {
            let read_lock = self.secrets.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = if self.file_path.exists() {
            let content = std::fs::read_to_string(&self.file_path)
                .map_err(|e| format!("Failed to read secret.json: {}", e.kind()))?;
            serde_json::from_str::<SecretConfig>(&content)
                .map_err(|e| format!("Failed to parse secret.json at line {}", e.line()))?
        } else {
            SecretConfig::default()
        };

        let mut write_lock = self.secrets.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig, String> {
        let mut secrets = self.load_file()?;

        if let Some(api_key) = &self.env_override {
            let model_name = secrets.gemini.as_ref().and_then(|g| g.model_name.clone());
            secrets.gemini = Some(GeminiConfig {
                api_key: api_key.clone(),
                model_name,
            });
        }

        Ok(secrets)
    }

    async fn secret_file_exists(&self) -> bool {
        self.file_path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_in(dir: &tempfile::TempDir) -> SecretServiceImpl {
        SecretServiceImpl::new(&WeaverPaths::new(Some(dir.path())))
            .unwrap()
            .with_env_override(None)
    }

    #[tokio::test]
    async fn test_missing_file_yields_empty_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        assert!(!service.secret_file_exists().await);
        let secrets = service.load_secrets().await.unwrap();
        assert!(secrets.gemini.is_none());
    }

    #[tokio::test]
    async fn test_reads_key_from_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("secret.json"),
            r#"{"gemini": {"api_key": "file-key", "model_name": "gemini-x"}}"#,
        )
        .unwrap();
        let service = service_in(&dir);

        let gemini = service.load_secrets().await.unwrap().gemini.unwrap();
        assert_eq!(gemini.api_key, "file-key");
        assert_eq!(gemini.model_name.as_deref(), Some("gemini-x"));
    }

    #[tokio::test]
    async fn test_env_override_wins_and_keeps_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("secret.json"),
            r#"{"gemini": {"api_key": "file-key", "model_name": "gemini-x"}}"#,
        )
        .unwrap();
        let service = service_in(&dir).with_env_override(Some("env-key".to_string()));

        let gemini = service.load_secrets().await.unwrap().gemini.unwrap();
        assert_eq!(gemini.api_key, "env-key");
        assert_eq!(gemini.model_name.as_deref(), Some("gemini-x"));
    }

    #[test]
    fn test_ensure_secret_file_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        let path = service.ensure_secret_file().unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("api_key"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(dir.path().join("secret.json"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
