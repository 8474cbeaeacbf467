//! End-to-end weave scenarios against in-memory agents.

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use weaver_application::{Warning, WeaveError, WeaveOutcome, WeaveUseCase};
use weaver_core::agent::{AudioClip, SpeechSynthesizer, TextAgent};
use weaver_core::error::{AgentError, GenerationCause};
use weaver_core::params::{
    GenerationParameters, Language, Length, Mood, ParameterSelection, Style, Theme, Tone,
};
use weaver_core::session::Session;
use weaver_render::{GlyphSource, IllustrationRenderer};

const POEM: &str = "Crimson leaves drift down\nwhispering to the cold earth\nautumn lets them go";

struct FixedAgent {
    reply: Result<String, AgentError>,
    calls: AtomicUsize,
}

impl FixedAgent {
    fn answer(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(err: AgentError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(err),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextAgent for FixedAgent {
    fn expertise(&self) -> &str {
        "fixed"
    }

    async fn execute(&self, _instruction: &str) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

struct FixedVoice {
    reply: Result<AudioClip, AgentError>,
    calls: AtomicUsize,
}

impl FixedVoice {
    fn working() -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(AudioClip::wav(b"RIFF-narration".to_vec())),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(AgentError::ProcessError {
                status_code: Some(503),
                message: "speech service unavailable".into(),
                is_retryable: true,
                retry_after: None,
            }),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for FixedVoice {
    async fn synthesize(&self, _text: &str) -> Result<AudioClip, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

fn renderer() -> IllustrationRenderer {
    IllustrationRenderer::new(GlyphSource::builtin())
}

fn use_case(
    classifier: Arc<FixedAgent>,
    generator: Arc<FixedAgent>,
    voice: Arc<FixedVoice>,
) -> WeaveUseCase {
    WeaveUseCase::new(classifier, generator, voice, renderer())
}

fn autumn_params() -> GenerationParameters {
    GenerationParameters {
        style: Style::Haiku,
        mood: Mood::Dreamy,
        language: Language::English,
        tone: Tone::Soft,
        length: Length::Short,
        theme: Theme::Nature,
    }
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

#[tokio::test]
async fn test_relevant_prompt_is_woven_end_to_end() {
    let studio = use_case(
        FixedAgent::answer("Yes"),
        FixedAgent::answer(POEM),
        FixedVoice::working(),
    );
    let mut session = Session::new();

    let outcome = studio
        .weave(&mut session, "autumn leaves falling", autumn_params())
        .await
        .unwrap();
    let woven = outcome.woven().expect("poem should be delivered");

    assert_eq!(woven.poem.text, POEM);
    assert_eq!(woven.poem.parameters, autumn_params());
    assert_eq!((woven.image.width, woven.image.height), (800, 600));
    assert_eq!(woven.image, renderer().render(&POEM.chars().take(200).collect::<String>()));

    let pdf = woven.document.as_ref().expect("document should be exported");
    assert!(pdf.starts_with(b"%PDF"));
    for line in POEM.lines() {
        assert!(contains(pdf, line), "PDF is missing {line:?}");
    }

    assert!(woven.narration.is_some());
    assert!(woven.warnings.is_empty());
    assert_eq!(session.len(), 1);
    assert_eq!(session.last_prompt(), "autumn leaves falling");
}

#[tokio::test]
async fn test_generation_failure_records_nothing() {
    let generator = FixedAgent::failing(AgentError::ProcessError {
        status_code: None,
        message: "network unreachable".into(),
        is_retryable: true,
        retry_after: None,
    });
    let voice = FixedVoice::working();
    let studio = use_case(FixedAgent::answer("yes"), generator.clone(), voice.clone());
    let mut session = Session::new();

    let err = studio
        .weave(&mut session, "autumn leaves falling", autumn_params())
        .await
        .unwrap_err();

    match err {
        WeaveError::Generation(err) => match err.cause {
            GenerationCause::Agent(cause) => assert!(cause.to_string().contains("network")),
            other => panic!("unexpected cause {other:?}"),
        },
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(generator.calls(), 1);
    assert_eq!(voice.calls.load(Ordering::SeqCst), 0);
    assert!(session.is_empty());
    assert!(session.image_history().is_empty());
}

#[tokio::test]
async fn test_narration_failure_is_only_a_warning() {
    let studio = use_case(
        FixedAgent::answer("yes"),
        FixedAgent::answer(POEM),
        FixedVoice::failing(),
    );
    let mut session = Session::new();

    let outcome = studio
        .weave(&mut session, "autumn leaves falling", autumn_params())
        .await
        .unwrap();
    let woven = outcome.woven().unwrap();

    assert!(woven.narration.is_none());
    assert!(matches!(woven.warnings.as_slice(), [Warning::Narration(_)]));
    assert!(woven.document.is_some());
    assert_eq!(session.poem_history().len(), 1);
    assert_eq!(session.image_history().len(), 1);
}

#[tokio::test]
async fn test_prompt_that_is_not_poetic_stops_before_generation() {
    let generator = FixedAgent::answer(POEM);
    let studio = use_case(FixedAgent::answer("No."), generator.clone(), FixedVoice::working());
    let mut session = Session::new();

    let outcome = studio
        .weave(&mut session, "how do I file taxes", autumn_params())
        .await
        .unwrap();

    assert!(matches!(outcome, WeaveOutcome::NotPoetic));
    assert_eq!(generator.calls(), 0);
    assert!(session.is_empty());
    assert_eq!(session.last_prompt(), "how do I file taxes");
}

#[tokio::test]
async fn test_classifier_outage_fails_open() {
    let studio = use_case(
        FixedAgent::failing(AgentError::ExecutionFailed("quota".into())),
        FixedAgent::answer(POEM),
        FixedVoice::working(),
    );
    let mut session = Session::new();

    let outcome = studio
        .weave(&mut session, "moonlit harbour", autumn_params())
        .await
        .unwrap();
    assert!(outcome.woven().is_some());
}

#[tokio::test]
async fn test_blank_prompt_is_rejected_without_calls() {
    let classifier = FixedAgent::answer("yes");
    let studio = use_case(classifier.clone(), FixedAgent::answer(POEM), FixedVoice::working());
    let mut session = Session::new();

    let err = studio
        .weave(&mut session, "   ", autumn_params())
        .await
        .unwrap_err();

    assert_eq!(err, WeaveError::EmptyPrompt);
    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn test_invalid_selection_is_rejected() {
    let studio = use_case(
        FixedAgent::answer("yes"),
        FixedAgent::answer(POEM),
        FixedVoice::working(),
    );
    let mut session = Session::new();
    let selection = ParameterSelection {
        style: Some("Limerick".into()),
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(1);

    let err = studio
        .weave_with_selection(&mut session, "sea", &selection, false, &mut rng)
        .await
        .unwrap_err();
    assert!(matches!(err, WeaveError::InvalidParameter(ref p) if p.value == "Limerick"));

    // Surprise ignores the bad explicit value.
    let outcome = studio
        .weave_with_selection(&mut session, "sea", &selection, true, &mut rng)
        .await
        .unwrap();
    assert!(outcome.woven().is_some());
}

#[tokio::test]
async fn test_clear_resets_histories_but_keeps_identity() {
    let studio = use_case(
        FixedAgent::answer("yes"),
        FixedAgent::answer(POEM),
        FixedVoice::working(),
    );
    let mut session = Session::with_identity("Ada");

    for prompt in ["first light", "second wind", "third rain"] {
        studio
            .weave(&mut session, prompt, autumn_params())
            .await
            .unwrap();
    }
    assert_eq!(session.len(), 3);
    assert_eq!(session.gallery().count(), 3);

    session.clear();
    assert!(session.poem_history().is_empty());
    assert!(session.image_history().is_empty());
    assert_eq!(session.last_prompt(), "");
    assert_eq!(session.identity(), "Ada");
}
