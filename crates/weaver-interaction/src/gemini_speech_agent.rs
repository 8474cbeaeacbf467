//! GeminiSpeechAgent - text-to-speech through the Gemini TTS models.
//!
//! The API answers with base64 raw PCM (signed 16-bit, mono); the agent wraps
//! it into a WAV container so callers get a playable file.

use crate::gemini_wire::{
    BASE_URL, Content, GenerateContentRequest, GenerationConfig, Part, PrebuiltVoiceConfig,
    SpeechConfig, VoiceConfig, extract_inline_data, send_generate_content,
};
use crate::wav;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::Client;
use std::time::Duration;
use weaver_core::agent::{AudioClip, SpeechSynthesizer};
use weaver_core::config::{DEFAULT_TTS_MODEL, DEFAULT_TTS_VOICE};
use weaver_core::error::AgentError;

/// Sample rate the TTS models use when the MIME type does not say.
const DEFAULT_PCM_RATE: u32 = 24_000;

#[derive(Clone)]
pub struct GeminiSpeechAgent {
    client: Client,
    api_key: String,
    model: String,
    voice: String,
    base_url: String,
}

impl GeminiSpeechAgent {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_TTS_MODEL.to_string(),
            voice: DEFAULT_TTS_VOICE.to_string(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Selects one of the prebuilt voices ("Kore", "Puck", ...).
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, AgentError> {
        self.client = Client::builder().timeout(timeout).build().map_err(|err| {
            AgentError::ExecutionFailed(format!("Failed to build HTTP client: {err}"))
        })?;
        Ok(self)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_request(&self, text: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(vec![Part::Text {
                text: text.to_string(),
            }])],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.voice.clone(),
                        },
                    },
                }),
            }),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiSpeechAgent {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, AgentError> {
        if text.trim().is_empty() {
            return Err(AgentError::ExecutionFailed("Nothing to narrate".into()));
        }

        let request = self.build_request(text);
        tracing::debug!(model = %self.model, voice = %self.voice, "[GeminiSpeechAgent] synthesizing");
        let response =
            send_generate_content(&self.client, &self.base_url, &self.model, &self.api_key, &request)
                .await?;
        let inline = extract_inline_data(response)?;

        let pcm_bytes = BASE64_STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|err| AgentError::Other(format!("Invalid audio payload: {err}")))?;
        let sample_rate = inline
            .mime_type
            .as_deref()
            .and_then(wav::sample_rate_from_mime)
            .unwrap_or(DEFAULT_PCM_RATE);

        let samples = wav::pcm16_from_le_bytes(&pcm_bytes);
        let wav_bytes = wav::encode_pcm16(&samples, sample_rate, 1)
            .map_err(|err| AgentError::Other(format!("Failed to encode narration: {err}")))?;

        Ok(AudioClip::wav(wav_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_voice_and_audio_modality() {
        let agent = GeminiSpeechAgent::new("key").with_voice("Puck");
        let json = serde_json::to_value(agent.build_request("Hello")).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(json["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            json["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Puck"
        );
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected() {
        let agent = GeminiSpeechAgent::new("key");
        assert!(agent.synthesize("  \n").await.is_err());
    }
}
