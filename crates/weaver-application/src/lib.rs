//! Application layer: the weave workflow and the steps it is built from.

pub mod generation;
pub mod input;
pub mod narration;
pub mod relevance;
pub mod weave_usecase;

#[cfg(test)]
mod testing;

pub use generation::PoemGenerator;
pub use input::{InputAcquirer, acquire_text};
pub use narration::{NARRATION_FILE_NAME, Narrator};
pub use relevance::{Relevance, RelevanceGate};
pub use weave_usecase::{
    EMPTY_PROMPT_MESSAGE, NOT_POETIC_MESSAGE, Warning, WeaveError, WeaveOutcome, WeaveUseCase,
    WovenPoem, surprise, surprise_message,
};
