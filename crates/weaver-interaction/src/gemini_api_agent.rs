//! GeminiApiAgent - Direct REST API implementation for Gemini.
//!
//! Serves as the text agent (poem generation and the relevance question) and
//! as the speech recogniser, by sending captured WAV audio as inline data.

use crate::gemini_wire::{
    BASE_URL, Content, GenerateContentRequest, InlineDataPayload, Part, extract_text_response,
    send_generate_content,
};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::Client;
use std::time::Duration;
use weaver_core::agent::{AudioClip, SpeechRecognizer, TextAgent};
use weaver_core::config::DEFAULT_GEMINI_MODEL;
use weaver_core::error::AgentError;
use weaver_core::secret::SecretService;

const TRANSCRIBE_INSTRUCTION: &str = "Transcribe the speech in this audio exactly as spoken. \
Reply with the transcript only. If there is no intelligible speech, reply with nothing.";

/// Agent implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiApiAgent {
    /// Creates a new agent with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Loads the API key through the secret service.
    ///
    /// Model name falls back to the one stored next to the key, then to
    /// `gemini-2.5-flash`.
    pub async fn try_from_secrets(
        service: &dyn SecretService,
        model: Option<&str>,
    ) -> Result<Self, AgentError> {
        let secret_config = service.load_secrets().await.map_err(|e| {
            AgentError::ExecutionFailed(format!("Failed to load secret.json: {}", e))
        })?;

        let gemini_config = secret_config
            .gemini
            .filter(|gemini| !gemini.api_key.trim().is_empty())
            .ok_or_else(|| {
                AgentError::ExecutionFailed(
                    "Gemini API key not found (set GEMINI_API_KEY or secret.json)".to_string(),
                )
            })?;

        let model = model
            .map(str::to_string)
            .or(gemini_config.model_name)
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        Ok(Self::new(gemini_config.api_key, model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Applies a per-request timeout to the underlying HTTP client.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, AgentError> {
        self.client = Client::builder().timeout(timeout).build().map_err(|err| {
            AgentError::ExecutionFailed(format!("Failed to build HTTP client: {err}"))
        })?;
        Ok(self)
    }

    /// Points the agent at another endpoint (proxies, local stubs).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, parts: Vec<Part>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(parts)],
            generation_config: None,
        }
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, AgentError> {
        let parsed =
            send_generate_content(&self.client, &self.base_url, &self.model, &self.api_key, body)
                .await?;
        extract_text_response(parsed)
    }
}

#[async_trait]
impl TextAgent for GeminiApiAgent {
    fn expertise(&self) -> &str {
        "Gemini API agent for poem writing and prompt classification"
    }

    async fn execute(&self, instruction: &str) -> Result<String, AgentError> {
        if instruction.trim().is_empty() {
            return Err(AgentError::ExecutionFailed(
                "Gemini payload must include text".into(),
            ));
        }

        let request = self.build_request(vec![Part::Text {
            text: instruction.to_string(),
        }]);
        tracing::debug!(model = %self.model, "[GeminiApiAgent] generateContent");
        self.send_request(&request).await
    }
}

#[async_trait]
impl SpeechRecognizer for GeminiApiAgent {
    async fn transcribe(&self, audio: &AudioClip) -> Result<String, AgentError> {
        if audio.is_empty() {
            return Err(AgentError::ExecutionFailed("No audio to transcribe".into()));
        }

        let request = self.build_request(vec![
            Part::Text {
                text: TRANSCRIBE_INSTRUCTION.to_string(),
            },
            Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: audio.mime_type.clone(),
                    data: BASE64_STANDARD.encode(&audio.bytes),
                },
            },
        ]);
        tracing::debug!(
            model = %self.model,
            bytes = audio.bytes.len(),
            "[GeminiApiAgent] transcribing audio"
        );
        Ok(self.send_request(&request).await?.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weaver_core::config::{GeminiConfig, SecretConfig};

    struct StaticSecrets(SecretConfig);

    #[async_trait]
    impl SecretService for StaticSecrets {
        async fn load_secrets(&self) -> Result<SecretConfig, String> {
            Ok(self.0.clone())
        }

        async fn secret_file_exists(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_try_from_secrets_prefers_explicit_model() {
        let secrets = StaticSecrets(SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: "key".to_string(),
                model_name: Some("stored-model".to_string()),
            }),
        });

        let agent = GeminiApiAgent::try_from_secrets(&secrets, Some("gemini-x"))
            .await
            .unwrap();
        assert_eq!(agent.model(), "gemini-x");

        let agent = GeminiApiAgent::try_from_secrets(&secrets, None).await.unwrap();
        assert_eq!(agent.model(), "stored-model");
    }

    #[tokio::test]
    async fn test_try_from_secrets_rejects_blank_key() {
        let secrets = StaticSecrets(SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: "  ".to_string(),
                model_name: None,
            }),
        });

        assert!(GeminiApiAgent::try_from_secrets(&secrets, None).await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_process_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let agent = GeminiApiAgent::new("key", "model").with_base_url("http://127.0.0.1:9");

        let err = agent.execute("Write a poem").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::ProcessError {
                status_code: None,
                ..
            }
        ));
    }

    #[test]
    fn test_text_request_carries_a_single_user_turn() {
        let agent = GeminiApiAgent::new("key", "model");
        let request = agent.build_request(vec![Part::Text {
            text: "Write a poem".to_string(),
        }]);

        let json = serde_json::to_value(&request).unwrap();
        let body = json.as_object().unwrap();
        assert_eq!(body.len(), 1);
        assert!(body.contains_key("contents"));
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Write a poem");
    }

    #[tokio::test]
    async fn test_blank_instruction_is_rejected_locally() {
        let agent = GeminiApiAgent::new("key", "model");
        assert!(matches!(
            agent.execute("   ").await,
            Err(AgentError::ExecutionFailed(_))
        ));
    }
}
