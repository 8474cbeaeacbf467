//! Input acquisition: typed prompts and spoken prompts.

use std::sync::Arc;
use std::time::Duration;
use weaver_core::agent::{AudioCapture, SpeechRecognizer};
use weaver_core::error::{InputUnavailable, UnavailableReason};

/// Normalises a typed prompt.
pub fn acquire_text(raw: &str) -> String {
    raw.trim().to_string()
}

/// Listens for one spoken prompt and transcribes it.
pub struct InputAcquirer {
    capture: Arc<dyn AudioCapture>,
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl InputAcquirer {
    pub fn new(capture: Arc<dyn AudioCapture>, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self {
            capture,
            recognizer,
        }
    }

    /// Captures and transcribes within `timeout`.
    ///
    /// The timeout covers capture and recognition together. Pending work is
    /// dropped once it expires.
    pub async fn listen(&self, timeout: Duration) -> Result<String, InputUnavailable> {
        match tokio::time::timeout(timeout, self.capture_and_transcribe()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(?timeout, "[InputAcquirer] Voice input timed out");
                Err(InputUnavailable::new(UnavailableReason::Timeout))
            }
        }
    }

    /// Like [`listen`](Self::listen), discarding the reason for failure.
    pub async fn acquire_voice(&self, timeout: Duration) -> Option<String> {
        match self.listen(timeout).await {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::info!("[InputAcquirer] {}", err);
                None
            }
        }
    }

    async fn capture_and_transcribe(&self) -> Result<String, InputUnavailable> {
        let clip = self.capture.capture().await?;
        if clip.is_empty() {
            return Err(InputUnavailable::new(UnavailableReason::NoSpeech));
        }

        let text = self.recognizer.transcribe(&clip).await.map_err(|err| {
            tracing::debug!("[InputAcquirer] Recognition failed: {}", err);
            InputUnavailable::new(UnavailableReason::Unrecognized)
        })?;

        let text = acquire_text(&text);
        if text.is_empty() {
            return Err(InputUnavailable::new(UnavailableReason::Unrecognized));
        }
        Ok(text)
    }
}
