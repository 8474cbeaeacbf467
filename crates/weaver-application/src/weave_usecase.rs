//! Weave use case: one prompt in, a delivered poem out.
//!
//! Steps run strictly in sequence: relevance gate, generation, illustration,
//! history append, narration, export. Generation failure stops the request
//! before anything is recorded. Narration and export failures only add
//! warnings; the poem and its illustration are kept either way.

use crate::generation::PoemGenerator;
use crate::narration::Narrator;
use crate::relevance::{Relevance, RelevanceGate};
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use weaver_core::agent::{AudioClip, SpeechSynthesizer, TextAgent};
use weaver_core::error::{ExportError, GenerationError, InvalidParameter, NarrationError};
use weaver_core::params::{GenerationParameters, ParameterSelection};
use weaver_core::session::{ImageRef, Poem, Session};
use weaver_render::{DocumentExporter, IllustrationRenderer};

pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter something!";
pub const NOT_POETIC_MESSAGE: &str = "Try something more poetic!";

/// A request that could not produce a poem.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeaveError {
    #[error("Please enter something!")]
    EmptyPrompt,

    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameter),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// A non-fatal failure attached to a delivered poem.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    Narration(NarrationError),
    Export(ExportError),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Narration(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
        }
    }
}

/// Everything delivered for one poem.
#[derive(Debug, Clone)]
pub struct WovenPoem {
    /// Position of the poem in the session history.
    pub index: usize,
    pub poem: Poem,
    pub image: ImageRef,
    pub narration: Option<AudioClip>,
    /// PDF bytes.
    pub document: Option<Vec<u8>>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub enum WeaveOutcome {
    /// The gate rejected the prompt; nothing was generated.
    NotPoetic,
    Woven(Box<WovenPoem>),
}

impl WeaveOutcome {
    pub fn woven(&self) -> Option<&WovenPoem> {
        match self {
            Self::Woven(woven) => Some(woven),
            Self::NotPoetic => None,
        }
    }
}

/// Announcement for a surprise selection.
pub fn surprise_message(params: &GenerationParameters) -> String {
    format!("Surprise settings: {}", params.summary())
}

/// Draws a random parameter set and its announcement.
pub fn surprise<R: Rng + ?Sized>(rng: &mut R) -> (GenerationParameters, String) {
    let params = GenerationParameters::random(rng);
    let message = surprise_message(&params);
    (params, message)
}

pub struct WeaveUseCase {
    gate: RelevanceGate,
    generator: PoemGenerator,
    renderer: IllustrationRenderer,
    narrator: Narrator,
    exporter: DocumentExporter,
}

impl WeaveUseCase {
    pub fn new(
        classifier: Arc<dyn TextAgent>,
        generator: Arc<dyn TextAgent>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        renderer: IllustrationRenderer,
    ) -> Self {
        let exporter = DocumentExporter::with_glyphs(renderer.glyphs());
        Self {
            gate: RelevanceGate::new(classifier),
            generator: PoemGenerator::new(generator),
            renderer,
            narrator: Narrator::new(synthesizer),
            exporter,
        }
    }

    pub fn renderer(&self) -> &IllustrationRenderer {
        &self.renderer
    }

    pub fn exporter(&self) -> &DocumentExporter {
        &self.exporter
    }

    /// Resolves the parameters first, then weaves.
    pub async fn weave_with_selection<R: Rng + ?Sized>(
        &self,
        session: &mut Session,
        raw_prompt: &str,
        selection: &ParameterSelection,
        randomize: bool,
        rng: &mut R,
    ) -> Result<WeaveOutcome, WeaveError> {
        let params = GenerationParameters::resolve(selection, randomize, rng)?;
        self.weave(session, raw_prompt, params).await
    }

    pub async fn weave(
        &self,
        session: &mut Session,
        raw_prompt: &str,
        params: GenerationParameters,
    ) -> Result<WeaveOutcome, WeaveError> {
        let prompt = crate::input::acquire_text(raw_prompt);
        if prompt.is_empty() {
            return Err(WeaveError::EmptyPrompt);
        }
        session.set_last_prompt(prompt.as_str());

        if let Relevance::NotRelevant = self.gate.check(&prompt).await {
            tracing::info!(session_id = %session.id, "[WeaveUseCase] Prompt rejected as not poetic");
            return Ok(WeaveOutcome::NotPoetic);
        }

        let text = self
            .generator
            .generate(&prompt, &params)
            .await
            .inspect_err(|err| {
                tracing::error!(session_id = %session.id, "[WeaveUseCase] {}", err);
            })?;

        let poem = Poem::new(text, params, prompt.as_str());
        let image = self.renderer.render(&poem.text);
        let index = session.record(poem.clone(), image.clone());
        tracing::info!(session_id = %session.id, index, %params, "[WeaveUseCase] Poem recorded");

        let mut warnings = Vec::new();

        let narration = match self.narrator.synthesize(&poem.text).await {
            Ok(clip) => Some(clip),
            Err(err) => {
                tracing::warn!("[WeaveUseCase] {}", err);
                warnings.push(Warning::Narration(err));
                None
            }
        };

        let document = match self.exporter.export(&poem.text, &image) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::warn!("[WeaveUseCase] {}", err);
                warnings.push(Warning::Export(err));
                None
            }
        };

        Ok(WeaveOutcome::Woven(Box::new(WovenPoem {
            index,
            poem,
            image,
            narration,
            document,
            warnings,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_surprise_message_lists_all_six_settings() {
        let mut rng = StdRng::seed_from_u64(7);
        let (params, message) = surprise(&mut rng);

        assert!(message.starts_with("Surprise settings: "));
        assert!(message.ends_with(&params.theme.to_string()));
        assert_eq!(message.matches(", ").count(), 5);
    }

    #[test]
    fn test_error_messages_match_user_facing_text() {
        assert_eq!(WeaveError::EmptyPrompt.to_string(), EMPTY_PROMPT_MESSAGE);
    }
}
