//! Poem domain model.

use crate::params::GenerationParameters;

/// A generated poem.
///
/// Created once by the generation pipeline and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poem {
    /// The poem text as returned by the model, trimmed.
    pub text: String,
    /// Parameters the poem was generated with.
    pub parameters: GenerationParameters,
    /// The prompt the user supplied.
    pub source_prompt: String,
}

impl Poem {
    pub fn new(
        text: impl Into<String>,
        parameters: GenerationParameters,
        source_prompt: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            parameters,
            source_prompt: source_prompt.into(),
        }
    }
}
