//! Scripted agents for unit tests.

use async_trait::async_trait;
use std::sync::Mutex;
use weaver_core::agent::{AudioCapture, AudioClip, SpeechRecognizer, SpeechSynthesizer, TextAgent};
use weaver_core::error::{AgentError, InputUnavailable, UnavailableReason};

/// Answers every instruction the same way and records what it was asked.
pub struct ScriptedAgent {
    reply: Result<String, AgentError>,
    instructions: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    pub fn answer(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            instructions: Mutex::new(Vec::new()),
        }
    }

    pub fn failure(err: AgentError) -> Self {
        Self {
            reply: Err(err),
            instructions: Mutex::new(Vec::new()),
        }
    }

    pub fn instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextAgent for ScriptedAgent {
    fn expertise(&self) -> &str {
        "scripted"
    }

    async fn execute(&self, instruction: &str) -> Result<String, AgentError> {
        self.instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());
        self.reply.clone()
    }
}

pub struct ScriptedSynthesizer {
    reply: Result<AudioClip, AgentError>,
}

impl ScriptedSynthesizer {
    pub fn audio(bytes: &[u8]) -> Self {
        Self {
            reply: Ok(AudioClip::wav(bytes.to_vec())),
        }
    }

    pub fn failure(err: AgentError) -> Self {
        Self { reply: Err(err) }
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<AudioClip, AgentError> {
        self.reply.clone()
    }
}

pub struct ScriptedRecognizer {
    reply: Result<String, AgentError>,
}

impl ScriptedRecognizer {
    pub fn answer(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
        }
    }

    pub fn failure(err: AgentError) -> Self {
        Self { reply: Err(err) }
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn transcribe(&self, _audio: &AudioClip) -> Result<String, AgentError> {
        self.reply.clone()
    }
}

pub struct ScriptedCapture {
    reply: Result<AudioClip, InputUnavailable>,
}

impl ScriptedCapture {
    pub fn speech() -> Self {
        Self {
            reply: Ok(AudioClip::wav(vec![1, 2, 3, 4])),
        }
    }

    pub fn failure(reason: UnavailableReason) -> Self {
        Self {
            reply: Err(InputUnavailable::new(reason)),
        }
    }
}

#[async_trait]
impl AudioCapture for ScriptedCapture {
    async fn capture(&self) -> Result<AudioClip, InputUnavailable> {
        self.reply.clone()
    }
}

/// A microphone that never hears anything and never returns.
pub struct PendingCapture;

#[async_trait]
impl AudioCapture for PendingCapture {
    async fn capture(&self) -> Result<AudioClip, InputUnavailable> {
        std::future::pending().await
    }
}
