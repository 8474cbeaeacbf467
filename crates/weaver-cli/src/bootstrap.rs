use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use weaver_application::{InputAcquirer, WeaveUseCase};
use weaver_core::agent::{AudioCapture, SpeechRecognizer};
use weaver_core::config::RootConfig;
use weaver_core::secret::SecretService;
use weaver_infrastructure::{ConfigService, SecretServiceImpl, WeaverPaths};
use weaver_interaction::{GeminiApiAgent, GeminiSpeechAgent, WavFileCapture};
use weaver_render::IllustrationRenderer;

use crate::downloads::Downloads;
use crate::logging;

/// Everything a command needs, wired from configuration and secrets.
pub struct AppBootstrap {
    pub config: RootConfig,
    pub use_case: WeaveUseCase,
    recognizer: Arc<dyn SpeechRecognizer>,
    _log_guard: Option<WorkerGuard>,
}

impl AppBootstrap {
    pub async fn initialize(config_dir: Option<&Path>) -> Result<Self> {
        let paths = WeaverPaths::new(config_dir);
        let config = ConfigService::new(paths.clone()).get_config();
        let log_guard = logging::init(&config.logging, &paths);

        let secret_service = SecretServiceImpl::new(&paths)?;
        let api_key = load_api_key(&secret_service).await?;

        let request_timeout = Duration::from_secs(config.generation.request_timeout_secs);
        let generator = GeminiApiAgent::new(api_key.as_str(), config.generation.model.as_str())
            .with_timeout(request_timeout)?;
        let classifier =
            GeminiApiAgent::new(api_key.as_str(), config.generation.classifier_model.as_str())
                .with_timeout(request_timeout)?;
        let recognizer =
            GeminiApiAgent::new(api_key.as_str(), config.speech.recognition_model.as_str())
                .with_timeout(request_timeout)?;
        let synthesizer = GeminiSpeechAgent::new(api_key.as_str())
            .with_model(config.speech.tts_model.as_str())
            .with_voice(config.speech.voice.as_str())
            .with_timeout(request_timeout)?;

        let renderer = IllustrationRenderer::from_settings(&config.render);
        tracing::info!(
            generation_model = %config.generation.model,
            tts_model = %config.speech.tts_model,
            builtin_font = renderer.glyphs().is_builtin(),
            "[Bootstrap] Weaver ready"
        );

        let use_case = WeaveUseCase::new(
            Arc::new(classifier),
            Arc::new(generator),
            Arc::new(synthesizer),
            renderer,
        );

        Ok(Self {
            config,
            use_case,
            recognizer: Arc::new(recognizer),
            _log_guard: log_guard,
        })
    }

    pub fn voice_timeout(&self) -> Duration {
        self.config.speech.voice_timeout()
    }

    /// Voice input read from a recorded WAV file.
    pub fn file_listener(&self, path: &Path) -> InputAcquirer {
        let capture = WavFileCapture::new(path, self.config.speech.silence_threshold);
        self.listener(Arc::new(capture))
    }

    /// Voice input from the default microphone, with the timeout to listen
    /// for. The timeout always leaves room for recognition after recording.
    #[cfg(feature = "microphone")]
    pub fn microphone_listener(&self) -> (InputAcquirer, Duration) {
        let speech = &self.config.speech;
        let timeout = speech.microphone_timeout();
        if speech.recognition_budget_secs() < weaver_core::config::MIN_RECOGNITION_SECS {
            tracing::warn!(
                record_secs = speech.record_secs,
                voice_timeout_secs = speech.voice_timeout_secs,
                "[AppBootstrap] Voice timeout leaves too little time for recognition, using {}s",
                timeout.as_secs()
            );
        }
        let capture = weaver_interaction::MicrophoneCapture::new(
            Duration::from_secs(speech.record_secs),
            speech.silence_threshold,
        );
        (self.listener(Arc::new(capture)), timeout)
    }

    fn listener(&self, capture: Arc<dyn AudioCapture>) -> InputAcquirer {
        InputAcquirer::new(capture, Arc::clone(&self.recognizer))
    }

    /// Download target: the explicit directory, the configured one, or the
    /// working directory.
    pub fn downloads(&self, explicit: Option<PathBuf>) -> Downloads {
        let dir = explicit
            .or_else(|| self.config.output.directory.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        Downloads::new(dir)
    }
}

async fn load_api_key(service: &SecretServiceImpl) -> Result<String> {
    let key = match service.load_secrets().await {
        Ok(secrets) => secrets
            .gemini
            .map(|gemini| gemini.api_key)
            .filter(|key| !key.trim().is_empty()),
        Err(err) => {
            tracing::warn!("[Bootstrap] {}", err);
            None
        }
    };

    match key {
        Some(key) => Ok(key),
        None => {
            let path = service
                .ensure_secret_file()
                .context("Failed to prepare secret.json")?;
            Err(anyhow!(
                "Gemini API key not configured. Set GEMINI_API_KEY or add it to {}",
                path.display()
            ))
        }
    }
}
