//! Narration: the poem read aloud by a speech synthesizer.

use std::sync::Arc;
use weaver_core::agent::{AudioClip, SpeechSynthesizer};
use weaver_core::error::NarrationError;

/// Download name for the narration audio.
pub const NARRATION_FILE_NAME: &str = "Poem_Narration.wav";

pub struct Narrator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Narrator {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { synthesizer }
    }

    /// One synthesis call; the caller decides what a failure means.
    pub async fn synthesize(&self, poem_text: &str) -> Result<AudioClip, NarrationError> {
        self.synthesizer
            .synthesize(poem_text)
            .await
            .map_err(|cause| NarrationError { cause })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSynthesizer;
    use weaver_core::error::AgentError;

    #[tokio::test]
    async fn test_audio_is_passed_through() {
        let narrator = Narrator::new(Arc::new(ScriptedSynthesizer::audio(b"RIFF....")));
        let clip = narrator.synthesize("A poem").await.unwrap();
        assert_eq!(clip.bytes, b"RIFF....");
    }

    #[tokio::test]
    async fn test_failure_keeps_agent_cause() {
        let narrator = Narrator::new(Arc::new(ScriptedSynthesizer::failure(
            AgentError::Other("offline".into()),
        )));
        let err = narrator.synthesize("A poem").await.unwrap_err();
        assert_eq!(err.cause, AgentError::Other("offline".into()));
    }
}
