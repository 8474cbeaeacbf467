//! Seams to the external capabilities Weaver depends on.
//!
//! Generation, classification, speech recognition and speech synthesis are
//! all delegated to remote services. The application layer only sees these
//! traits, so tests can swap in scripted agents.

use crate::error::{AgentError, InputUnavailable};
use async_trait::async_trait;

/// MIME type of every audio payload Weaver produces or captures.
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Encoded audio, either captured from the user or synthesised.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioClip {
    pub fn wav(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: WAV_MIME_TYPE.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioClip")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// A model that answers a single free-text instruction with free text.
///
/// Used both for poem generation and for the yes/no relevance question.
#[async_trait]
pub trait TextAgent: Send + Sync {
    /// Short description used in logs.
    fn expertise(&self) -> &str;

    /// Submits the instruction once and returns the raw answer.
    async fn execute(&self, instruction: &str) -> Result<String, AgentError>;
}

/// Turns captured audio into text.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn transcribe(&self, audio: &AudioClip) -> Result<String, AgentError>;
}

/// Turns text into audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, AgentError>;
}

/// A one-shot source of spoken input.
///
/// `capture` may wait for as long as the source needs; callers bound it with
/// their own timeout and drop the future when it expires.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    async fn capture(&self) -> Result<AudioClip, InputUnavailable>;
}
