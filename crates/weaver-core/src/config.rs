//! Configuration models.
//!
//! `RootConfig` mirrors `~/.config/weaver/config.toml`; every section falls
//! back to its defaults when missing. `SecretConfig` mirrors `secret.json`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_TTS_VOICE: &str = "Kore";
/// Seconds reserved for uploading and transcribing a microphone recording.
pub const MIN_RECOGNITION_SECS: u64 = 8;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RootConfig {
    pub generation: GenerationSettings,
    pub speech: SpeechSettings,
    pub render: RenderSettings,
    pub logging: LoggingSettings,
    pub output: OutputSettings,
}

/// Models used for the poem and for the relevance question.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub classifier_model: String,
    /// HTTP timeout for a single request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            classifier_model: DEFAULT_GEMINI_MODEL.to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SpeechSettings {
    pub tts_model: String,
    pub voice: String,
    pub recognition_model: String,
    /// Upper bound for voice capture plus recognition.
    pub voice_timeout_secs: u64,
    /// How long the microphone records once started.
    pub record_secs: u64,
    /// RMS level under which captured audio counts as silence.
    pub silence_threshold: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            voice: DEFAULT_TTS_VOICE.to_string(),
            recognition_model: DEFAULT_GEMINI_MODEL.to_string(),
            voice_timeout_secs: 15,
            record_secs: 4,
            silence_threshold: 0.01,
        }
    }
}

impl SpeechSettings {
    pub fn voice_timeout(&self) -> Duration {
        Duration::from_secs(self.voice_timeout_secs)
    }

    /// Seconds left for recognition once the microphone stops recording.
    pub fn recognition_budget_secs(&self) -> u64 {
        self.voice_timeout_secs.saturating_sub(self.record_secs)
    }

    /// Timeout for microphone input. Raised above `voice_timeout_secs` when
    /// that would leave less than [`MIN_RECOGNITION_SECS`] for recognition.
    pub fn microphone_timeout(&self) -> Duration {
        let floor = self.record_secs.saturating_add(MIN_RECOGNITION_SECS);
        Duration::from_secs(self.voice_timeout_secs.max(floor))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    /// TrueType fonts tried before the system locations.
    pub font_paths: Vec<String>,
    pub font_size: f32,
    /// Skip every TrueType lookup and use the built-in glyphs.
    pub builtin_font_only: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            font_paths: Vec::new(),
            font_size: 24.0,
            builtin_font_only: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Also write a daily log file under the logs directory.
    pub file_logging: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            file_logging: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct OutputSettings {
    /// Where downloads are written. Defaults to the working directory.
    pub directory: Option<String>,
}

/// Root structure of secret.json
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}
