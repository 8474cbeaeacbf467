//! Poem generation pipeline.

use minijinja::Environment;
use serde::Serialize;
use std::sync::Arc;
use weaver_core::agent::TextAgent;
use weaver_core::error::{GenerationCause, GenerationError};
use weaver_core::params::GenerationParameters;

const INSTRUCTION_TEMPLATE: &str = "Write a {{ length }} {{ style }} poem in {{ language }} \
with a {{ mood }} mood, {{ tone }} tone, and {{ theme }} theme:\n\n{{ prompt }}";

#[derive(Serialize)]
struct InstructionContext<'a> {
    style: String,
    mood: String,
    language: String,
    tone: String,
    length: String,
    theme: String,
    prompt: &'a str,
}

/// Builds the generation instruction for a prompt and parameter set.
pub fn build_instruction(
    prompt: &str,
    params: &GenerationParameters,
) -> Result<String, GenerationError> {
    let context = InstructionContext {
        style: params.style.to_string(),
        mood: params.mood.to_string(),
        language: params.language.to_string(),
        tone: params.tone.to_string(),
        length: params.length.to_string(),
        theme: params.theme.to_string(),
        prompt,
    };

    // Plain text, no HTML escaping.
    let env = Environment::new();
    env.render_str(INSTRUCTION_TEMPLATE, &context)
        .map_err(|e| GenerationError::new(GenerationCause::Instruction(e.to_string())))
}

/// Sends one instruction per prompt to the generation model.
pub struct PoemGenerator {
    agent: Arc<dyn TextAgent>,
}

impl PoemGenerator {
    pub fn new(agent: Arc<dyn TextAgent>) -> Self {
        Self { agent }
    }

    /// Generates a poem. Submitted once; no retry.
    pub async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParameters,
    ) -> Result<String, GenerationError> {
        let instruction = build_instruction(prompt, params)?;
        tracing::debug!(agent = self.agent.expertise(), %params, "[PoemGenerator] Requesting poem");

        let text = self.agent.execute(&instruction).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::new(GenerationCause::EmptyResponse));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedAgent;
    use weaver_core::error::AgentError;
    use weaver_core::params::{Language, Length, Mood, Style, Theme, Tone};

    fn haiku_params() -> GenerationParameters {
        GenerationParameters {
            style: Style::Haiku,
            mood: Mood::Dreamy,
            language: Language::French,
            tone: Tone::Soft,
            length: Length::Short,
            theme: Theme::Nature,
        }
    }

    #[test]
    fn test_instruction_wording() {
        let instruction = build_instruction("Ocean at dawn", &haiku_params()).unwrap();
        assert_eq!(
            instruction,
            "Write a Short Haiku poem in French with a Dreamy mood, Soft tone, and Nature theme:\n\nOcean at dawn"
        );
    }

    #[test]
    fn test_instruction_keeps_prompt_verbatim() {
        let prompt = "Roses & <thorns> {{ not a tag }}";
        let instruction = build_instruction(prompt, &GenerationParameters::default()).unwrap();
        assert!(instruction.ends_with(prompt));
        assert!(instruction.starts_with("Write a Short Shakespearean poem in English"));
    }

    #[tokio::test]
    async fn test_generated_text_is_trimmed() {
        let generator = PoemGenerator::new(Arc::new(ScriptedAgent::answer("\n  Waves fold.\n")));
        let poem = generator.generate("sea", &haiku_params()).await.unwrap();
        assert_eq!(poem, "Waves fold.");
    }

    #[tokio::test]
    async fn test_blank_answer_is_unusable() {
        let generator = PoemGenerator::new(Arc::new(ScriptedAgent::answer("  ")));
        let err = generator.generate("sea", &haiku_params()).await.unwrap_err();
        assert_eq!(err.cause, GenerationCause::EmptyResponse);
    }

    #[tokio::test]
    async fn test_agent_failure_is_typed_and_submitted_once() {
        let agent = Arc::new(ScriptedAgent::failure(AgentError::ExecutionFailed(
            "quota exceeded".into(),
        )));
        let generator = PoemGenerator::new(agent.clone());

        let err = generator.generate("sea", &haiku_params()).await.unwrap_err();
        assert!(matches!(err.cause, GenerationCause::Agent(_)));
        assert_eq!(agent.instructions().len(), 1);
    }
}
