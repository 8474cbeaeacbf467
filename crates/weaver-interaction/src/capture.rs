//! Audio capture sources for voice prompts.

use crate::wav;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use weaver_core::agent::{AudioCapture, AudioClip};
use weaver_core::error::{InputUnavailable, UnavailableReason};

/// Reads a pre-recorded WAV file as the spoken prompt.
#[derive(Debug, Clone)]
pub struct WavFileCapture {
    path: PathBuf,
    silence_threshold: f32,
}

impl WavFileCapture {
    pub fn new(path: impl AsRef<Path>, silence_threshold: f32) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            silence_threshold,
        }
    }
}

#[async_trait]
impl AudioCapture for WavFileCapture {
    async fn capture(&self) -> Result<AudioClip, InputUnavailable> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|err| {
            tracing::warn!("[WavFileCapture] Cannot read {}: {}", self.path.display(), err);
            InputUnavailable::new(UnavailableReason::CaptureFailed)
        })?;

        let decoded = wav::decode(&bytes).map_err(|err| {
            tracing::warn!("[WavFileCapture] {} is not a WAV file: {}", self.path.display(), err);
            InputUnavailable::new(UnavailableReason::CaptureFailed)
        })?;

        speech_or_silence(bytes, &decoded.samples, self.silence_threshold)
    }
}

fn speech_or_silence(
    wav_bytes: Vec<u8>,
    samples: &[f32],
    threshold: f32,
) -> Result<AudioClip, InputUnavailable> {
    let level = wav::rms(samples);
    if level <= threshold {
        tracing::debug!(level, threshold, "[AudioCapture] Only ambient noise captured");
        return Err(InputUnavailable::new(UnavailableReason::NoSpeech));
    }
    Ok(AudioClip::wav(wav_bytes))
}

#[cfg(feature = "microphone")]
pub use microphone::MicrophoneCapture;

#[cfg(feature = "microphone")]
mod microphone {
    use super::speech_or_silence;
    use crate::wav;
    use async_trait::async_trait;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::oneshot;
    use weaver_core::agent::{AudioCapture, AudioClip};
    use weaver_core::error::{InputUnavailable, UnavailableReason};

    /// Records a fixed window from the default input device.
    ///
    /// cpal streams are not `Send`, so recording happens on a dedicated
    /// thread that reports back through a oneshot channel. If the caller's
    /// timeout fires first the receiver is dropped and the result discarded.
    #[derive(Debug, Clone)]
    pub struct MicrophoneCapture {
        record_for: Duration,
        silence_threshold: f32,
    }

    impl MicrophoneCapture {
        pub fn new(record_for: Duration, silence_threshold: f32) -> Self {
            Self {
                record_for,
                silence_threshold,
            }
        }
    }

    #[async_trait]
    impl AudioCapture for MicrophoneCapture {
        async fn capture(&self) -> Result<AudioClip, InputUnavailable> {
            let (tx, rx) = oneshot::channel();
            let record_for = self.record_for;
            std::thread::spawn(move || {
                let _ = tx.send(record_blocking(record_for));
            });

            let recorded = rx
                .await
                .map_err(|_| InputUnavailable::new(UnavailableReason::CaptureFailed))?;
            let (samples, sample_rate, channels) = recorded.map_err(|message| {
                tracing::warn!("[MicrophoneCapture] {}", message);
                InputUnavailable::new(UnavailableReason::CaptureFailed)
            })?;

            let wav_bytes = wav::encode_f32(&samples, sample_rate, channels).map_err(|err| {
                tracing::warn!("[MicrophoneCapture] Failed to encode capture: {}", err);
                InputUnavailable::new(UnavailableReason::CaptureFailed)
            })?;
            speech_or_silence(wav_bytes, &samples, self.silence_threshold)
        }
    }

    fn record_blocking(record_for: Duration) -> Result<(Vec<f32>, u32, u16), String> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| "No input device available".to_string())?;
        let supported = device
            .default_input_config()
            .map_err(|e| format!("No input config: {e}"))?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let err_fn = |err: cpal::StreamError| {
            tracing::warn!("[MicrophoneCapture] Stream error: {}", err);
        };

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                let sink = Arc::clone(&buffer);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(data);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            cpal::SampleFormat::I16 => {
                let sink = Arc::clone(&buffer);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend(data.iter().map(|&s| s as f32 / i16::MAX as f32));
                        }
                    },
                    err_fn,
                    None,
                )
            }
            other => return Err(format!("Unsupported sample format: {other:?}")),
        }
        .map_err(|e| format!("Failed to open input stream: {e}"))?;

        stream
            .play()
            .map_err(|e| format!("Failed to start recording: {e}"))?;
        std::thread::sleep(record_for);
        drop(stream);

        let samples = buffer
            .lock()
            .map(|buf| buf.clone())
            .map_err(|_| "Capture buffer poisoned".to_string())?;
        Ok((samples, sample_rate, channels))
    }
}
