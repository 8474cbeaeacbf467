//! Error types for the Weaver application.
//!
//! `WeaverError` covers configuration, storage and IO failures shared by every
//! crate. The remaining types describe the typed outcomes of a single weave
//! request, so callers can tell a fail-open dependency apart from one that
//! must stop the request.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A shared error type for the entire Weaver application.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum WeaverError {
    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WeaverError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for WeaverError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for WeaverError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for WeaverError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for WeaverError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, WeaverError>`.
pub type Result<T> = std::result::Result<T, WeaverError>;

/// Transport-level failure reported by an external agent.
///
/// Every remote capability (generation, classification, recognition,
/// synthesis) reports failures through this type. The request-level error
/// types below wrap it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    /// The agent could not build or execute the request.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The remote service answered with an error or could not be reached.
    #[error("Process error (status: {status_code:?}): {message}")]
    ProcessError {
        status_code: Option<u16>,
        message: String,
        is_retryable: bool,
        retry_after: Option<Duration>,
    },

    /// The remote answer could not be interpreted.
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    pub fn process_error_with_retry_after(
        status_code: u16,
        message: impl Into<String>,
        is_retryable: bool,
        retry_after: Duration,
    ) -> Self {
        Self::ProcessError {
            status_code: Some(status_code),
            message: message.into(),
            is_retryable,
            retry_after: Some(retry_after),
        }
    }

    /// Whether a later attempt could succeed. Weaver never retries on its own,
    /// but the front end uses this to phrase the warning.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProcessError {
                is_retryable: true,
                ..
            }
        )
    }
}

/// A parameter value outside its enumerated domain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field}: '{value}' (expected one of: {expected})")]
pub struct InvalidParameter {
    pub field: &'static str,
    pub value: String,
    pub expected: String,
}

/// Why a voice capture produced no transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Nothing was captured and recognised before the timeout.
    Timeout,
    /// Audio was captured but contained no speech.
    NoSpeech,
    /// The recogniser failed or returned nothing usable.
    Unrecognized,
    /// The capture device or file could not be read.
    CaptureFailed,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Timeout => "timed out waiting for speech",
            Self::NoSpeech => "no speech detected",
            Self::Unrecognized => "speech could not be recognised",
            Self::CaptureFailed => "audio capture failed",
        };
        f.write_str(text)
    }
}

/// Voice capture produced no transcript. Callers retry or fall back to text.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("No voice input: {reason}")]
pub struct InputUnavailable {
    pub reason: UnavailableReason,
}

impl InputUnavailable {
    pub fn new(reason: UnavailableReason) -> Self {
        Self { reason }
    }
}

/// The relevance classifier failed. The gate treats this as relevant.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Relevance check unavailable: {cause}")]
pub struct RelevanceCheckUnavailable {
    pub cause: AgentError,
}

/// What made a generation request unusable.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationCause {
    /// The generation agent failed.
    Agent(AgentError),
    /// The agent answered, but with blank text.
    EmptyResponse,
    /// The instruction template could not be rendered.
    Instruction(String),
}

impl std::fmt::Display for GenerationCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agent(err) => write!(f, "{err}"),
            Self::EmptyResponse => f.write_str("the model returned an empty poem"),
            Self::Instruction(message) => write!(f, "failed to build instruction: {message}"),
        }
    }
}

/// Generation failed; fatal to the current request only.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Poem generation failed: {cause}")]
pub struct GenerationError {
    pub cause: GenerationCause,
}

impl GenerationError {
    pub fn new(cause: GenerationCause) -> Self {
        Self { cause }
    }
}

impl From<AgentError> for GenerationError {
    fn from(err: AgentError) -> Self {
        Self::new(GenerationCause::Agent(err))
    }
}

/// Speech synthesis failed; the poem is delivered without audio.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Narration unavailable: {cause}")]
pub struct NarrationError {
    pub cause: AgentError,
}

/// The PDF could not be produced; the poem and image are still delivered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("Failed to encode illustration: {0}")]
    Image(String),

    #[error("Failed to build PDF: {0}")]
    Pdf(String),
}
