//! External agents for Weaver.
//!
//! Everything that leaves the process lives here: the Gemini REST agents for
//! text, recognition and speech, plus the local audio capture sources.

pub mod capture;
pub mod gemini_api_agent;
pub mod gemini_speech_agent;
mod gemini_wire;
pub mod wav;

pub use capture::WavFileCapture;
#[cfg(feature = "microphone")]
pub use capture::MicrophoneCapture;
pub use gemini_api_agent::GeminiApiAgent;
pub use gemini_speech_agent::GeminiSpeechAgent;
